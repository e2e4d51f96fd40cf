// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    abci::Header,
    application::AxiomApplication,
    backend::{Backend, BackendError, BlockInfo, BlockTally, RewardStrategy},
    hash::keccak,
    query::{QueryError, RpcClient},
    state::StateView,
    validators::{StaticElection, ValidatorManager},
};
use axm_types::{Address, H256, U256};
use keylib::KeyPair;
use parking_lot::Mutex;
use primitives::{Account, Action, SignedTransaction, Transaction};
use rlp::RlpStream;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};

/// In-memory account state; snapshots are plain clones, so writes to a
/// snapshot never reach the state it came from.
#[derive(Clone, Default)]
pub struct MemoryState {
    accounts: HashMap<Address, Account>,
}

impl MemoryState {
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.address, account);
    }

    /// Deterministic digest: keccak over the RLP of accounts in address
    /// order.
    pub fn state_root(&self) -> H256 {
        let mut addresses: Vec<&Address> = self.accounts.keys().collect();
        addresses.sort();
        let mut stream = RlpStream::new_list(addresses.len());
        for address in addresses {
            stream.append(&self.accounts[address]);
        }
        keccak(stream.out())
    }
}

impl StateView for MemoryState {
    fn exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    fn balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map_or_else(U256::zero, |account| account.balance)
    }

    fn nonce(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map_or_else(U256::zero, |account| account.nonce)
    }

    fn add_balance(&mut self, address: &Address, by: &U256) {
        let account = self.accounts.entry(*address).or_insert_with(|| {
            Account::new_empty_with_balance(
                address,
                &U256::zero(),
                &U256::zero(),
            )
        });
        account.balance = account.balance.saturating_add(*by);
    }

    fn sub_balance(&mut self, address: &Address, by: &U256) {
        if let Some(account) = self.accounts.get_mut(address) {
            account.balance = account.balance.saturating_sub(*by);
        }
    }

    fn set_nonce(&mut self, address: &Address, nonce: &U256) {
        let account = self.accounts.entry(*address).or_insert_with(|| {
            Account::new_empty_with_balance(
                address,
                &U256::zero(),
                &U256::zero(),
            )
        });
        account.nonce = *nonce;
    }
}

struct PendingBlock {
    state: MemoryState,
    receiver: Address,
    time: i64,
}

struct Inner {
    committed: MemoryState,
    pending: Option<PendingBlock>,
    height: u64,
    last_hash: H256,
    gas_limit: U256,
    broken: bool,
}

/// Execution backend over `MemoryState`, deterministic by construction:
/// block hashes are keccak over (height, state root, receiver).
pub struct MockBackend {
    inner: Mutex<Inner>,
}

impl MockBackend {
    pub fn new(genesis: MemoryState) -> Arc<MockBackend> {
        Arc::new(MockBackend {
            inner: Mutex::new(Inner {
                committed: genesis,
                pending: None,
                height: 0,
                last_hash: H256::zero(),
                gas_limit: 100_000_000.into(),
                broken: false,
            }),
        })
    }

    pub fn set_gas_limit(&self, gas_limit: U256) {
        self.inner.lock().gas_limit = gas_limit;
    }

    pub fn committed(&self) -> MemoryState {
        self.inner.lock().committed.clone()
    }

    /// Makes every state read fail, to exercise the fatal commit path.
    pub fn break_state(&self) { self.inner.lock().broken = true; }
}

impl Backend for MockBackend {
    fn current_block(&self) -> BlockInfo {
        let inner = self.inner.lock();
        BlockInfo {
            height: inner.height,
            hash: inner.last_hash,
            state_root: inner.committed.state_root(),
        }
    }

    fn gas_limit(&self) -> U256 { self.inner.lock().gas_limit }

    fn state_snapshot(&self) -> Result<Box<dyn StateView>, BackendError> {
        let inner = self.inner.lock();
        if inner.broken {
            return Err(BackendError::StateUnavailable(
                "state detached".into(),
            ));
        }
        Ok(Box::new(inner.committed.clone()))
    }

    fn init_pending_block(
        &self, receiver: Address,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        let state = inner.committed.clone();
        inner.pending = Some(PendingBlock {
            state,
            receiver,
            time: 0,
        });
        Ok(())
    }

    fn update_header_with_time_info(&self, header: &Header) {
        if let Some(ref mut pending) = self.inner.lock().pending {
            pending.time = header.time;
        }
    }

    fn deliver_tx(
        &self, tx: Arc<SignedTransaction>,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        let pending = inner.pending.as_mut().ok_or_else(|| {
            BackendError::Execution("no open block".into())
        })?;
        let receiver = pending.receiver;
        let state = &mut pending.state;

        let from = tx.sender();
        if state.nonce(&from) != tx.nonce() {
            return Err(BackendError::Execution(format!(
                "invalid nonce {}",
                tx.nonce()
            )));
        }
        let cost = tx.cost();
        if state.balance(&from) < cost {
            return Err(BackendError::Execution(
                "insufficient balance".into(),
            ));
        }

        state.sub_balance(&from, &cost);
        if let Action::Call(ref to) = tx.action {
            state.add_balance(to, &tx.value);
        }
        state.set_nonce(&from, &(tx.nonce() + U256::one()));
        let fee = tx.gas_price().saturating_mul(*tx.gas());
        state.add_balance(&receiver, &fee);
        Ok(())
    }

    fn accumulate_rewards(
        &self, strategy: &dyn RewardStrategy, tally: &BlockTally,
    ) {
        let mut inner = self.inner.lock();
        if let Some(ref mut pending) = inner.pending {
            for (address, amount) in strategy.rewards(tally) {
                pending.state.add_balance(&address, &amount);
            }
        }
    }

    fn commit(&self, receiver: Address) -> Result<H256, BackendError> {
        let mut inner = self.inner.lock();
        if inner.broken {
            return Err(BackendError::StateUnavailable(
                "state detached".into(),
            ));
        }
        let pending = inner.pending.take().ok_or_else(|| {
            BackendError::StateUnavailable("no pending block".into())
        })?;
        inner.committed = pending.state;
        inner.height += 1;

        let root = inner.committed.state_root();
        let mut stream = RlpStream::new_list(3);
        stream.append(&inner.height);
        stream.append(&root);
        stream.append(&receiver);
        inner.last_hash = keccak(stream.out());
        Ok(inner.last_hash)
    }
}

/// Pays no one beyond the fees delivery already moved.
pub struct NullRewards;

impl RewardStrategy for NullRewards {
    fn rewards(&self, _tally: &BlockTally) -> Vec<(Address, U256)> {
        Vec::new()
    }
}

/// Pays the proposer a fixed amount per block.
pub struct FixedProposerReward(pub U256);

impl RewardStrategy for FixedProposerReward {
    fn rewards(&self, tally: &BlockTally) -> Vec<(Address, U256)> {
        vec![(tally.proposer, self.0)]
    }
}

/// Answers every call with `{method, params}`, so tests can see what was
/// forwarded.
pub struct EchoRpc;

impl RpcClient for EchoRpc {
    fn call(
        &self, method: &str, params: &[Value],
    ) -> Result<Value, QueryError> {
        Ok(json!({ "method": method, "params": params }))
    }
}

pub fn new_test_account(
    address: &Address, balance: u64, nonce: u64,
) -> Account {
    Account::new_empty_with_balance(address, &balance.into(), &nonce.into())
}

/// Wire bytes for a signed transfer, the shape wallets submit.
pub fn new_test_tx(
    sender: &KeyPair, nonce: usize, gas_price: usize, gas: usize,
    value: usize, to: Option<Address>,
) -> Vec<u8>
{
    let tx = Transaction {
        nonce: nonce.into(),
        gas_price: gas_price.into(),
        gas: gas.into(),
        action: to.map_or(Action::Create, Action::Call),
        value: value.into(),
        data: Vec::new(),
    };
    let signed = tx.sign(sender.secret(), Some(1));
    rlp::encode(&signed.transaction).to_vec()
}

pub fn new_test_app(backend: Arc<MockBackend>) -> AxiomApplication {
    AxiomApplication::new(
        backend,
        Arc::new(EchoRpc),
        Arc::new(NullRewards),
        ValidatorManager::new(Arc::new(StaticElection), None),
    )
    .expect("fresh backend has a readable state")
}
