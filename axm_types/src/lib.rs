// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

extern crate ethereum_types;

pub use ethereum_types::{
    Address, BigEndianHash, H128, H160, H256, H512, H520, H64, U128, U256,
    U512, U64,
};

/// Uncompressed secp256k1 public key without the tag byte.
pub type Public = H512;

/// 32 bytes of secret key material.
pub type Secret = H256;
