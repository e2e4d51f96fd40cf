// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

mod error;
mod keypair;
mod random;
mod signature;

use lazy_static::lazy_static;

pub use self::{
    error::Error,
    keypair::{public_to_address, KeyPair},
    random::Random,
    signature::{recover, sign, verify_public, Signature},
};

pub use axm_types::{Address, Public, Secret};
use axm_types::H256;

/// A 32-byte digest to be signed.
pub type Message = H256;

lazy_static! {
    pub static ref SECP256K1: secp256k1::Secp256k1<secp256k1::All> =
        secp256k1::Secp256k1::new();
}

/// Generates new keypairs.
pub trait Generator {
    type Error;

    /// Should be called to generate a new keypair.
    fn generate(&mut self) -> Result<KeyPair, Self::Error>;
}
