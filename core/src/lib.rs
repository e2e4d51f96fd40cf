// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

extern crate keccak_hash as hash;
#[macro_use]
extern crate log;

pub mod abci;
pub mod application;
pub mod backend;
pub mod error;
pub mod executive;
pub mod query;
pub mod state;
#[cfg(test)]
mod test_helpers;
pub mod validators;

pub use crate::{
    abci::Application,
    application::{AxiomApplication, MAX_TRANSACTION_SIZE},
    backend::{Backend, BackendError, BlockInfo, BlockTally, RewardStrategy},
    query::{QueryError, RpcClient},
    state::StateView,
    validators::{
        StaticElection, ValidatorElection, ValidatorEntry, ValidatorManager,
        ValidatorsHistory,
    },
};
