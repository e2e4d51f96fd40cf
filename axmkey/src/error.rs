// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use std::{error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidSecret,
    InvalidPublic,
    InvalidMessage,
    InvalidSignature,
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Error::InvalidSecret => "Invalid secret",
            Error::InvalidPublic => "Invalid public",
            Error::InvalidMessage => "Invalid message",
            Error::InvalidSignature => "Invalid EC signature",
            Error::Custom(ref s) => s.as_str(),
        };

        f.write_str(msg)
    }
}

impl error::Error for Error {}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Error {
        match e {
            secp256k1::Error::InvalidSecretKey => Error::InvalidSecret,
            secp256k1::Error::InvalidPublicKey => Error::InvalidPublic,
            secp256k1::Error::InvalidMessage => Error::InvalidMessage,
            _ => Error::InvalidSignature,
        }
    }
}
