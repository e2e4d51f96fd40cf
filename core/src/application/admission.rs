// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{decode_tx, AxiomApplication, MAX_TRANSACTION_SIZE};
use crate::{error::AdmissionError, executive};
use axm_types::U256;
use primitives::{Action, SignedTransaction};
use std::sync::Arc;

impl AxiomApplication {
    /// Checks the validity of a tx against the mempool view of state,
    /// duplicating the rules the execution path enforces at delivery.
    ///
    /// Checks run in a fixed order and stop at the first failure; on
    /// success the view is advanced by the transaction's balance and
    /// nonce effects so later submissions see them.
    pub(crate) fn validate_tx(
        &self, tx_bytes: &[u8],
    ) -> Result<Arc<SignedTransaction>, AdmissionError> {
        if tx_bytes.len() > MAX_TRANSACTION_SIZE {
            return Err(AdmissionError::Oversized {
                size: tx_bytes.len(),
                limit: MAX_TRANSACTION_SIZE,
            });
        }

        let tx = decode_tx(tx_bytes)?;

        // Replay-protected transactions recover through the chain-id-aware
        // signer, legacy ones through the pre-fork signer; either way the
        // transaction must be signed properly.
        let public = tx.recover_public()?;
        let tx = Arc::new(SignedTransaction::new(public, tx));
        let from = tx.sender();

        // Values are unsigned on the wire, so the negative-value rejection
        // of the taxonomy cannot trigger for decoded input.

        let mut state = self.check_tx_state.lock();

        // Can't send from a non-existing account.
        if !state.exists(&from) {
            return Err(AdmissionError::UnknownSender(from));
        }

        // The transaction must fit the current block gas limit.
        let gas_limit = self.backend.gas_limit();
        if tx.gas > gas_limit {
            return Err(AdmissionError::GasLimitExceeded {
                limit: gas_limit,
                got: tx.gas,
            });
        }

        // A mempool ordered by strict nonce equality holds no gaps;
        // gapped transactions are resubmitted once their predecessor is
        // included.
        let nonce = state.nonce(&from);
        if nonce != tx.nonce {
            return Err(AdmissionError::InvalidNonce {
                expected: nonce,
                got: tx.nonce,
            });
        }

        // The sender must have enough funds to cover the costs.
        // cost == V + GP * GL
        let balance = state.balance(&from);
        let cost = tx.cost();
        if balance < cost {
            return Err(AdmissionError::InsufficientBalance { balance, cost });
        }

        let intrinsic = executive::gas_required_for(
            tx.action == Action::Create,
            &tx.data,
            &self.spec,
        );
        if tx.gas < U256::from(intrinsic) {
            return Err(AdmissionError::InsufficientGas {
                minimal: intrinsic,
                got: tx.gas,
            });
        }

        // Advance the view: charge the sender, credit the recipient, bump
        // the nonce.
        state.sub_balance(&from, &cost);
        if let Action::Call(ref to) = tx.action {
            state.add_balance(to, &tx.value);
        }
        state.set_nonce(&from, &(tx.nonce + U256::one()));

        Ok(tx)
    }
}
