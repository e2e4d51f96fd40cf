// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Request/response types of the consensus-engine-facing protocol, and the
//! `Application` surface serving them.

use axm_types::Address;
use primitives::Bytes;

/// Response codes shared by every operation. The numeric values are part of
/// the wire contract and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CodeType {
    Ok = 0,
    Internal = 1,
    UnknownRequest = 6,
    UnknownAddress = 9,
    OutOfGas = 12,
}

impl From<CodeType> for u32 {
    fn from(code: CodeType) -> u32 { code as u32 }
}

/// Converts consensus-supplied address bytes into an execution address,
/// keeping the low 20 bytes and left-padding short input.
pub fn bytes_to_address(bytes: &[u8]) -> Address {
    let mut address = Address::zero();
    if bytes.len() >= 20 {
        address.as_bytes_mut().copy_from_slice(&bytes[bytes.len() - 20..]);
    } else {
        address.as_bytes_mut()[20 - bytes.len()..].copy_from_slice(bytes);
    }
    address
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInfo;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseInfo {
    pub data: String,
    pub last_block_height: i64,
    pub last_block_app_hash: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSetOption {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSetOption;

/// A member of the validator set, also the shape of a set update: power 0
/// communicates a removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    pub address: Bytes,
    pub pub_key: Bytes,
    pub power: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInitChain {
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseInitChain;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub log: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposer {
    pub address: Bytes,
    pub power: i64,
}

/// Consensus view of the block being opened; the execution backend folds
/// the time info into its pending header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub chain_id: String,
    pub height: i64,
    /// Unix seconds agreed on by consensus.
    pub time: i64,
    pub num_txs: i64,
    pub proposer: Proposer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteInfo {
    pub validator: Validator,
    pub signed_last_block: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastCommitInfo {
    pub round: i32,
    pub votes: Vec<VoteInfo>,
}

/// Equivocation or similar misbehaviour reported by consensus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    pub validator: Validator,
    pub height: i64,
    pub time: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBeginBlock {
    pub hash: Bytes,
    pub header: Header,
    pub last_commit_info: LastCommitInfo,
    pub byzantine_validators: Vec<Evidence>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBeginBlock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDeliverTx {
    pub code: u32,
    pub log: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestEndBlock {
    pub height: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseEndBlock {
    pub validator_updates: Vec<Validator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCommit {
    /// Hash of the newly committed block.
    pub data: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
    pub path: String,
    pub data: Bytes,
    pub height: i64,
    pub prove: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseQuery {
    pub code: u32,
    pub value: Bytes,
    pub log: String,
}

/// The surface the consensus engine drives. Requests on the consensus
/// connection arrive strictly sequentially; implementations must not
/// reorder state mutations internally.
pub trait Application: Send + Sync {
    fn info(&self, req: RequestInfo) -> ResponseInfo;
    fn set_option(&self, req: RequestSetOption) -> ResponseSetOption;
    fn init_chain(&self, req: RequestInitChain) -> ResponseInitChain;
    fn check_tx(&self, tx_bytes: &[u8]) -> ResponseCheckTx;
    fn begin_block(&self, req: RequestBeginBlock) -> ResponseBeginBlock;
    fn deliver_tx(&self, tx_bytes: &[u8]) -> ResponseDeliverTx;
    fn end_block(&self, req: RequestEndBlock) -> ResponseEndBlock;
    fn commit(&self) -> ResponseCommit;
    fn query(&self, req: RequestQuery) -> ResponseQuery;
}
