// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

extern crate keccak_hash as hash;

pub mod account;
pub mod bytes;
pub mod transaction;

pub use crate::{
    account::Account,
    bytes::Bytes,
    transaction::{
        Action, SignedTransaction, Signer, Transaction,
        TransactionWithSignature,
    },
};
