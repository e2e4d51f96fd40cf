// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The active validator set and the per-block update pipeline. The set is
//! loaded from genesis at InitChain and only ever changes through the
//! deltas emitted at EndBlock.

use crate::{
    abci::{bytes_to_address, Validator},
    backend::BlockTally,
};
use axm_types::Address;
use kvdb::KeyValueDB;
use parking_lot::RwLock;
use primitives::Bytes;
use rlp::Rlp;
use rlp_derive::{RlpDecodable, RlpEncodable};
use std::{io, sync::Arc};

/// Column holding one RLP-encoded set snapshot per block height.
const COL_HISTORY: u32 = 0;

/// Columns the app-private database is opened with.
pub const NUM_COLUMNS: u32 = 1;

/// One member of the active validator set.
#[derive(Clone, Debug, PartialEq, Eq, RlpDecodable, RlpEncodable)]
pub struct ValidatorEntry {
    pub address: Address,
    pub pub_key: Bytes,
    pub power: u64,
}

impl ValidatorEntry {
    fn from_update(update: &Validator) -> ValidatorEntry {
        ValidatorEntry {
            address: bytes_to_address(&update.address),
            pub_key: update.pub_key.clone(),
            power: update.power.max(0) as u64,
        }
    }
}

/// Election policy producing the validator-set delta at the end of each
/// block. Removals are encoded as zero voting power.
pub trait ValidatorElection: Send + Sync {
    fn elect(
        &self, height: u64, current: &[ValidatorEntry], tally: &BlockTally,
    ) -> Vec<Validator>;
}

/// Keeps the genesis set for the lifetime of the chain.
pub struct StaticElection;

impl ValidatorElection for StaticElection {
    fn elect(
        &self, _height: u64, _current: &[ValidatorEntry],
        _tally: &BlockTally,
    ) -> Vec<Validator>
    {
        Vec::new()
    }
}

/// Per-height snapshots of the set, persisted into the app-private
/// database. Purely an operator aid; never read on the consensus path.
pub struct ValidatorsHistory {
    db: Arc<dyn KeyValueDB>,
}

impl ValidatorsHistory {
    pub fn new(db: Arc<dyn KeyValueDB>) -> ValidatorsHistory {
        ValidatorsHistory { db }
    }

    pub fn record(
        &self, height: u64, validators: &[ValidatorEntry],
    ) -> io::Result<()> {
        let mut transaction = self.db.transaction();
        transaction.put(
            COL_HISTORY,
            &height.to_be_bytes(),
            &rlp::encode_list::<ValidatorEntry, _>(validators),
        );
        self.db.write(transaction)
    }

    pub fn validators_at(
        &self, height: u64,
    ) -> io::Result<Option<Vec<ValidatorEntry>>> {
        let raw = match self.db.get(COL_HISTORY, &height.to_be_bytes())? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let validators = Rlp::new(&raw).as_list().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, e.to_string())
        })?;
        Ok(Some(validators))
    }
}

/// Owns the current set; translates InitChain genesis validators and
/// election results into the updates consensus expects.
pub struct ValidatorManager {
    current: RwLock<Vec<ValidatorEntry>>,
    election: Arc<dyn ValidatorElection>,
    history: Option<ValidatorsHistory>,
}

impl ValidatorManager {
    pub fn new(
        election: Arc<dyn ValidatorElection>,
        history: Option<ValidatorsHistory>,
    ) -> ValidatorManager
    {
        ValidatorManager {
            current: RwLock::new(Vec::new()),
            election,
            history,
        }
    }

    /// Loads the genesis validator set supplied by consensus.
    pub fn set_validators(&self, initial: &[Validator]) {
        *self.current.write() = initial
            .iter()
            .map(ValidatorEntry::from_update)
            .collect();
    }

    pub fn validators(&self) -> Vec<ValidatorEntry> {
        self.current.read().clone()
    }

    /// Validator-set delta for the block ending at `height`. The delta is
    /// applied to the local set and the post-block set is snapshotted into
    /// the history.
    pub fn updates_at_height(
        &self, height: u64, tally: &BlockTally,
    ) -> Vec<Validator> {
        let mut current = self.current.write();
        let updates = self.election.elect(height, &current, tally);

        for update in &updates {
            let address = bytes_to_address(&update.address);
            if update.power <= 0 {
                current.retain(|v| v.address != address);
            } else if let Some(entry) =
                current.iter_mut().find(|v| v.address == address)
            {
                entry.power = update.power as u64;
                entry.pub_key = update.pub_key.clone();
            } else {
                current.push(ValidatorEntry::from_update(update));
            }
        }

        if let Some(ref history) = self.history {
            if let Err(e) = history.record(height, &current) {
                warn!(
                    "Failed to record validator history, height={} err={}",
                    height, e
                );
            }
        }

        updates
    }
}
