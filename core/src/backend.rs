// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{abci::Header, state::StateView};
use axm_types::{Address, H256, U256};
use primitives::SignedTransaction;
use std::{error, fmt, sync::Arc};

/// Descriptor of the chain head the last commit produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub height: u64,
    pub hash: H256,
    pub state_root: H256,
}

/// Ledger of what the open block delivered, fed to reward accumulation
/// and validator election at block end. Dropped at commit.
#[derive(Debug, Clone, Default)]
pub struct BlockTally {
    pub proposer: Address,
    pub transactions: Vec<Arc<SignedTransaction>>,
    /// Fees declared by the delivered transactions.
    pub gas_fees: U256,
}

impl BlockTally {
    pub fn new(proposer: Address) -> BlockTally {
        BlockTally {
            proposer,
            transactions: Vec::new(),
            gas_fees: U256::zero(),
        }
    }

    pub fn record(&mut self, tx: Arc<SignedTransaction>) {
        self.gas_fees = self
            .gas_fees
            .saturating_add(tx.gas_price().saturating_mul(*tx.gas()));
        self.transactions.push(tx);
    }
}

/// Validator compensation policy, injected at construction.
pub trait RewardStrategy: Send + Sync {
    /// Amounts credited when the block described by `tally` is finalized.
    fn rewards(&self, tally: &BlockTally) -> Vec<(Address, U256)>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Pending-block execution refused the transaction.
    Execution(String),
    /// Backend state could not be read.
    StateUnavailable(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BackendError::Execution(ref msg) => {
                write!(f, "Execution error ({})", msg)
            }
            BackendError::StateUnavailable(ref msg) => {
                write!(f, "Backend state unavailable ({})", msg)
            }
        }
    }
}

impl error::Error for BackendError {}

/// The execution engine and its world state, owned elsewhere in the node.
///
/// The bridge drives it through the per-block sequence: open a pending
/// block, fold in the consensus header, deliver the ordered batch,
/// accumulate rewards, commit. The committed state is mutated only inside
/// `commit`.
pub trait Backend: Send + Sync {
    /// Chain head the last commit produced.
    fn current_block(&self) -> BlockInfo;

    /// Gas ceiling of the pending block.
    fn gas_limit(&self) -> U256;

    /// Owned copy of the last committed state. Writes to the copy never
    /// reach the committed state.
    fn state_snapshot(&self) -> Result<Box<dyn StateView>, BackendError>;

    /// Opens the pending block with the given fee receiver.
    fn init_pending_block(&self, receiver: Address)
        -> Result<(), BackendError>;

    /// Folds the consensus header's time info into the pending header.
    fn update_header_with_time_info(&self, header: &Header);

    /// Executes an ordered transaction against the pending block's
    /// intermediate state.
    fn deliver_tx(
        &self, tx: Arc<SignedTransaction>,
    ) -> Result<(), BackendError>;

    /// Applies the reward strategy's payouts to the pending block.
    fn accumulate_rewards(
        &self, strategy: &dyn RewardStrategy, tally: &BlockTally,
    );

    /// Seals the pending block into the committed state; returns the new
    /// block's hash.
    fn commit(&self, receiver: Address) -> Result<H256, BackendError>;
}
