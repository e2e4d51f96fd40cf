// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use axm_types::{Address, U256};

/// Writable view over per-account execution state.
///
/// The admission path owns one such view, snapshotted from the committed
/// state right after every commit and advanced by each accepted
/// transaction's balance and nonce effects. Writes must never reach the
/// state the view was snapshotted from.
pub trait StateView: Send {
    fn exists(&self, address: &Address) -> bool;

    fn balance(&self, address: &Address) -> U256;

    fn nonce(&self, address: &Address) -> U256;

    fn add_balance(&mut self, address: &Address, by: &U256);

    fn sub_balance(&mut self, address: &Address, by: &U256);

    fn set_nonce(&mut self, address: &Address, nonce: &U256);
}
