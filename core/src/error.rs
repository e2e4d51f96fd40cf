// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::abci::CodeType;
use axm_types::{Address, U256};
use std::{error, fmt};

#[derive(Debug, Clone, PartialEq)]
/// Reasons a transaction is refused admission to the mempool. Delivery
/// shares the stateless kinds, so clients see consistent failures on both
/// paths.
pub enum AdmissionError {
    /// Serialized size exceeds the admission bound.
    Oversized { size: usize, limit: usize },
    /// The bytes are not a well-formed transaction encoding.
    InvalidRlp(String),
    /// Sender recovery failed.
    InvalidSignature(String),
    /// Transferred value is negative. Cannot occur for canonical
    /// encodings; guards out-of-band constructions.
    NegativeValue,
    /// The state has never seen the sending account.
    UnknownSender(Address),
    /// Declared gas exceeds the block gas ceiling.
    GasLimitExceeded { limit: U256, got: U256 },
    /// Nonce does not extend the sender's mempool view.
    InvalidNonce { expected: U256, got: U256 },
    /// Balance cannot cover `value + gas_price * gas`.
    InsufficientBalance { balance: U256, cost: U256 },
    /// Declared gas is below the intrinsic cost of carrying the payload.
    InsufficientGas { minimal: u64, got: U256 },
}

impl AdmissionError {
    /// The numeric response code this rejection surfaces as.
    pub fn code(&self) -> CodeType {
        use self::AdmissionError::*;

        match *self {
            Oversized { .. }
            | InvalidRlp(_)
            | InvalidSignature(_)
            | InvalidNonce { .. } => CodeType::Internal,
            NegativeValue
            | InsufficientBalance { .. }
            | InsufficientGas { .. } => CodeType::UnknownRequest,
            UnknownSender(_) => CodeType::UnknownAddress,
            GasLimitExceeded { .. } => CodeType::OutOfGas,
        }
    }
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::AdmissionError::*;

        let msg = match *self {
            Oversized { size, limit } => {
                format!("Oversized data. Size={}, Limit={}", size, limit)
            }
            InvalidRlp(ref err) => {
                format!("Transaction has invalid RLP structure: {}.", err)
            }
            InvalidSignature(ref err) => {
                format!("Transaction has invalid signature: {}.", err)
            }
            NegativeValue => "Negative value is not allowed".into(),
            UnknownSender(ref address) => {
                format!("Unknown sender account: {:?}", address)
            }
            GasLimitExceeded { limit, got } => {
                format!("Gas limit exceeded. Limit={}, Got={}", limit, got)
            }
            InvalidNonce { expected, got } => format!(
                "Nonce not strictly increasing. Expected {} Got {}",
                expected, got
            ),
            InsufficientBalance { balance, cost } => {
                format!("Current balance: {}, tx cost: {}", balance, cost)
            }
            InsufficientGas { minimal, got } => format!(
                "Intrinsic gas too low. Required={}, Got={}",
                minimal, got
            ),
        };

        f.write_fmt(format_args!("Transaction error ({})", msg))
    }
}

impl error::Error for AdmissionError {}

impl From<rlp::DecoderError> for AdmissionError {
    fn from(err: rlp::DecoderError) -> Self {
        AdmissionError::InvalidRlp(format!("{}", err))
    }
}

impl From<keylib::Error> for AdmissionError {
    fn from(err: keylib::Error) -> Self {
        AdmissionError::InvalidSignature(format!("{}", err))
    }
}
