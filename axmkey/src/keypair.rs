// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Address, Error, Public, Secret, SECP256K1};
use keccak_hash::keccak;
use secp256k1::{PublicKey, SecretKey};
use std::fmt;

/// The sender address is the low 160 bits of the public key's keccak digest.
pub fn public_to_address(public: &Public) -> Address {
    let hash = keccak(public);
    let mut result = Address::zero();
    result.as_bytes_mut().copy_from_slice(&hash[12..]);
    result
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPair {
    secret: Secret,
    public: Public,
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "public:  {:x}", self.public)?;
        write!(f, "address: {:x}", self.address())
    }
}

impl KeyPair {
    pub fn from_secret(secret: Secret) -> Result<KeyPair, Error> {
        let context = &SECP256K1;
        let sec = SecretKey::from_slice(secret.as_bytes())?;
        let publ = PublicKey::from_secret_key(context, &sec);
        Ok(KeyPair {
            secret,
            public: public_from_key(&publ),
        })
    }

    pub(crate) fn from_keypair(sec: SecretKey, publ: PublicKey) -> KeyPair {
        KeyPair {
            secret: Secret::from_slice(&sec.secret_bytes()),
            public: public_from_key(&publ),
        }
    }

    pub fn secret(&self) -> &Secret { &self.secret }

    pub fn public(&self) -> &Public { &self.public }

    pub fn address(&self) -> Address { public_to_address(&self.public) }
}

fn public_from_key(publ: &PublicKey) -> Public {
    let serialized = publ.serialize_uncompressed();
    let mut public = Public::zero();
    public.as_bytes_mut().copy_from_slice(&serialized[1..65]);
    public
}
