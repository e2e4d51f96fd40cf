// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The application facade the consensus engine drives. It serializes the
//! per-block request sequence `BeginBlock -> DeliverTx* -> EndBlock ->
//! Commit`, keeps the mempool view of state in step with admission, and
//! hands everything execution-related to the backend.

mod admission;


use crate::{
    abci::{
        bytes_to_address, Application, CodeType, RequestBeginBlock,
        RequestEndBlock, RequestInfo, RequestInitChain, RequestQuery,
        RequestSetOption, ResponseBeginBlock, ResponseCheckTx,
        ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ResponseInfo,
        ResponseInitChain, ResponseQuery, ResponseSetOption,
    },
    backend::{Backend, BackendError, BlockTally, RewardStrategy},
    executive::Spec,
    query::{forward_query, RpcClient},
    state::StateView,
    validators::ValidatorManager,
};
use axm_types::Address;
use parking_lot::Mutex;
use primitives::{SignedTransaction, TransactionWithSignature};
use std::{mem, sync::Arc};

/// Heuristic limit; transactions over 32KB are rejected to prevent DOS
/// attacks.
pub const MAX_TRANSACTION_SIZE: usize = 32768;

/// Decodes the canonical transaction encoding submitted by wallets and RPC
/// servers.
pub(crate) fn decode_tx(
    bytes: &[u8],
) -> Result<TransactionWithSignature, rlp::DecoderError> {
    rlp::decode(bytes)
}

/// Where the facade sits in the per-block request sequence. The per-block
/// transient state only exists while a block is open, so a delivery
/// outside one has nothing to run against.
enum BlockPhase {
    /// Between blocks; only admission and reads may run.
    Idle,
    /// BeginBlock seen; delivering the ordered batch.
    InBlock(BlockTally),
    /// EndBlock seen; awaiting Commit.
    Finalizing(BlockTally),
}

/// An ABCI application bridging the consensus engine to an Ethereum-style
/// execution backend.
pub struct AxiomApplication {
    /// Handles the execution state machine and the services around it.
    backend: Arc<dyn Backend>,
    /// Mempool projection of the last committed state; advanced by each
    /// admitted transaction, replaced wholesale at every commit.
    check_tx_state: Mutex<Box<dyn StateView>>,
    /// Read-only RPC surface queries are forwarded to.
    rpc_client: Arc<dyn RpcClient>,
    /// Strategy for validator compensation.
    strategy: Arc<dyn RewardStrategy>,
    validators: ValidatorManager,
    spec: Spec,
    phase: Mutex<BlockPhase>,
}

impl AxiomApplication {
    /// Creates a fully initialised application over an execution backend.
    pub fn new(
        backend: Arc<dyn Backend>, rpc_client: Arc<dyn RpcClient>,
        strategy: Arc<dyn RewardStrategy>, validators: ValidatorManager,
    ) -> Result<AxiomApplication, BackendError>
    {
        let state = backend.state_snapshot()?;
        let app = AxiomApplication {
            backend,
            check_tx_state: Mutex::new(state),
            rpc_client,
            strategy,
            validators,
            spec: Spec::new_spec(),
            phase: Mutex::new(BlockPhase::Idle),
        };
        app.backend.init_pending_block(Address::zero())?;
        Ok(app)
    }
}

impl Application for AxiomApplication {
    fn info(&self, _req: RequestInfo) -> ResponseInfo {
        let head = self.backend.current_block();
        debug!("Info, height={}", head.height);

        // The consensus engine detects a fresh chain, with no block
        // committed yet, by an empty app hash; height 0 must not report a
        // digest of the genesis state.
        if head.height == 0 {
            return ResponseInfo {
                data: "ABCIEthereum".into(),
                last_block_height: 0,
                last_block_app_hash: Vec::new(),
            };
        }

        ResponseInfo {
            data: "ABCIEthereum".into(),
            last_block_height: head.height as i64,
            last_block_app_hash: head.hash.as_bytes().to_vec(),
        }
    }

    fn set_option(&self, req: RequestSetOption) -> ResponseSetOption {
        debug!("SetOption, key={} value={}", req.key, req.value);
        ResponseSetOption::default()
    }

    fn init_chain(&self, req: RequestInitChain) -> ResponseInitChain {
        debug!("InitChain, validators={}", req.validators.len());
        match *self.phase.lock() {
            BlockPhase::Idle => {}
            _ => panic!("InitChain received while a block is open"),
        }
        self.validators.set_validators(&req.validators);
        ResponseInitChain::default()
    }

    fn check_tx(&self, tx_bytes: &[u8]) -> ResponseCheckTx {
        match self.validate_tx(tx_bytes) {
            Ok(tx) => {
                debug!("CheckTx: accepted transaction, hash={:?}", tx.hash());
                ResponseCheckTx {
                    code: CodeType::Ok.into(),
                    log: String::new(),
                }
            }
            Err(e) => {
                debug!("CheckTx: rejected transaction, err={}", e);
                ResponseCheckTx {
                    code: e.code().into(),
                    log: e.to_string(),
                }
            }
        }
    }

    fn begin_block(&self, req: RequestBeginBlock) -> ResponseBeginBlock {
        debug!("BeginBlock, height={}", req.header.height);

        let mut phase = self.phase.lock();
        match *phase {
            BlockPhase::Idle => {}
            _ => panic!("BeginBlock received while a block is open"),
        }

        let proposer = bytes_to_address(&req.header.proposer.address);
        debug!("Proposer address is {:?}", proposer);

        if let Err(e) = self.backend.init_pending_block(proposer) {
            panic!("Failed to open the pending block: {}", e);
        }

        // Update the execution header with the consensus header's time
        // info.
        self.backend.update_header_with_time_info(&req.header);

        *phase = BlockPhase::InBlock(BlockTally::new(proposer));
        ResponseBeginBlock::default()
    }

    fn deliver_tx(&self, tx_bytes: &[u8]) -> ResponseDeliverTx {
        let mut phase = self.phase.lock();
        let tally = match *phase {
            BlockPhase::InBlock(ref mut tally) => tally,
            _ => panic!("DeliverTx received outside an open block"),
        };

        // The batch is already ordered; a transaction that fails here is
        // recorded as a failed delivery, never a reason to stop the block.
        let tx = match decode_tx(tx_bytes) {
            Ok(tx) => tx,
            Err(e) => {
                debug!("DeliverTx: received invalid transaction, err={}", e);
                return ResponseDeliverTx {
                    code: CodeType::Internal.into(),
                    log: e.to_string(),
                };
            }
        };
        let tx = match tx.recover_public() {
            Ok(public) => Arc::new(SignedTransaction::new(public, tx)),
            Err(e) => {
                debug!("DeliverTx: sender recovery failed, err={}", e);
                return ResponseDeliverTx {
                    code: CodeType::Internal.into(),
                    log: e.to_string(),
                };
            }
        };
        debug!("DeliverTx: received valid transaction, hash={:?}", tx.hash());

        if let Err(e) = self.backend.deliver_tx(tx.clone()) {
            error!(
                "DeliverTx: error delivering tx to the backend, hash={:?} \
                 err={}",
                tx.hash(),
                e
            );
            return ResponseDeliverTx {
                code: CodeType::Internal.into(),
                log: e.to_string(),
            };
        }

        tally.record(tx);
        ResponseDeliverTx {
            code: CodeType::Ok.into(),
            log: String::new(),
        }
    }

    fn end_block(&self, req: RequestEndBlock) -> ResponseEndBlock {
        debug!("EndBlock, height={}", req.height);

        let mut phase = self.phase.lock();
        let tally = match mem::replace(&mut *phase, BlockPhase::Idle) {
            BlockPhase::InBlock(tally) => tally,
            _ => panic!("EndBlock received outside an open block"),
        };

        self.backend.accumulate_rewards(&*self.strategy, &tally);
        let updates =
            self.validators.updates_at_height(req.height as u64, &tally);

        *phase = BlockPhase::Finalizing(tally);
        ResponseEndBlock {
            validator_updates: updates,
        }
    }

    fn commit(&self) -> ResponseCommit {
        debug!("Commit");

        let mut phase = self.phase.lock();
        let tally = match mem::replace(&mut *phase, BlockPhase::Idle) {
            BlockPhase::Finalizing(tally) => tally,
            _ => panic!("Commit received before EndBlock"),
        };

        // Failing to produce the new state here would leave this replica
        // silently diverged; halting is the only safe outcome.
        let block_hash = match self.backend.commit(tally.proposer) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Error committing the pending block, err={}", e);
                panic!("Error getting latest ethereum state");
            }
        };
        let head = self.backend.current_block();
        info!(
            "Committing, block_hash={:?} state_root={:?}",
            block_hash, head.state_root
        );

        let state = match self.backend.state_snapshot() {
            Ok(state) => state,
            Err(e) => {
                error!("Error getting latest state, err={}", e);
                panic!("Error getting latest state");
            }
        };
        *self.check_tx_state.lock() = state;

        ResponseCommit {
            data: block_hash.as_bytes().to_vec(),
        }
    }

    fn query(&self, req: RequestQuery) -> ResponseQuery {
        debug!("Query, path={:?}", req.path);
        match forward_query(&*self.rpc_client, &req.data) {
            Ok(value) => ResponseQuery {
                code: CodeType::Ok.into(),
                value,
                log: String::new(),
            },
            Err(e) => ResponseQuery {
                code: CodeType::Internal.into(),
                value: Vec::new(),
                log: e.to_string(),
            },
        }
    }
}
