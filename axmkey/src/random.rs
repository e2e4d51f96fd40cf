// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Generator, KeyPair, SECP256K1};

/// Keypair generator drawing from the OS entropy pool.
pub struct Random;

impl Generator for Random {
    type Error = std::io::Error;

    fn generate(&mut self) -> Result<KeyPair, Self::Error> {
        let (sec, publ) = SECP256K1.generate_keypair(&mut rand::thread_rng());
        Ok(KeyPair::from_keypair(sec, publ))
    }
}
