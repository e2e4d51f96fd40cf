// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The slice of the execution cost model the bridge checks itself:
//! intrinsic gas of carrying a payload on chain.

/// Gas cost table, fixed at the homestead values the execution backend
/// enforces.
#[derive(Debug, Clone)]
pub struct Spec {
    /// Transaction cost.
    pub tx_gas: usize,
    /// `CREATE` transaction cost.
    pub tx_create_gas: usize,
    /// Additional cost for empty data transaction.
    pub tx_data_zero_gas: usize,
    /// Additional cost for non-empty data transaction.
    pub tx_data_non_zero_gas: usize,
}

impl Spec {
    pub const fn new_spec() -> Spec {
        Spec {
            tx_gas: 21000,
            tx_create_gas: 53000,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
        }
    }
}

/// Minimum gas required to carry `data` in a transaction of the given kind.
///
/// Overflow cannot occur for admissible payload sizes; if it does, the
/// replica aborts rather than disagree with its peers on admissibility.
pub fn gas_required_for(is_create: bool, data: &[u8], spec: &Spec) -> u64 {
    let base = if is_create {
        spec.tx_create_gas
    } else {
        spec.tx_gas
    };
    let gas = data.iter().try_fold(base as u64, |g, b| {
        g.checked_add(match *b {
            0 => spec.tx_data_zero_gas as u64,
            _ => spec.tx_data_non_zero_gas as u64,
        })
    });
    match gas {
        Some(gas) => gas,
        None => {
            error!(
                "Intrinsic gas overflowed, is_create={} data_len={}",
                is_create,
                data.len()
            );
            panic!("Intrinsic gas failed!");
        }
    }
}
