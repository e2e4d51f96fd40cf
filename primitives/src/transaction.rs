// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{bytes::Bytes, hash::keccak};
use axm_types::{Address, BigEndianHash, H160, H256, U256};
use keylib::{self, public_to_address, recover, Public, Secret, Signature};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use std::ops::Deref;

/// Fake address for unsigned transactions.
pub const UNSIGNED_SENDER: Address = H160([0xff; 20]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create creates new contract.
    Create,
    /// Calls contract at given address.
    /// In the case of a transfer, this is the receiver's address.
    Call(Address),
}

impl Default for Action {
    fn default() -> Action { Action::Create }
}

impl Decodable for Action {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.is_empty() {
            Ok(Action::Create)
        } else {
            Ok(Action::Call(rlp.as_val()?))
        }
    }
}

impl Encodable for Action {
    fn rlp_append(&self, stream: &mut RlpStream) {
        match *self {
            Action::Create => stream.append_internal(&""),
            Action::Call(ref address) => stream.append_internal(address),
        };
    }
}

/// Signing scheme a transaction commits to. Replay-protected transactions
/// fold a chain id into `v`; legacy transactions do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signer {
    Legacy,
    ChainId(u64),
}

impl Signer {
    /// Selects the signer a transaction was signed with.
    pub fn for_transaction(tx: &TransactionWithSignature) -> Signer {
        match tx.chain_id() {
            Some(chain_id) => Signer::ChainId(chain_id),
            None => Signer::Legacy,
        }
    }

    /// The digest the sender's signature covers under this signer.
    pub fn signature_hash(&self, tx: &Transaction) -> H256 {
        let mut s = RlpStream::new();
        match *self {
            Signer::Legacy => {
                s.begin_list(6);
                tx.rlp_append_unsigned(&mut s);
            }
            Signer::ChainId(chain_id) => {
                s.begin_list(9);
                tx.rlp_append_unsigned(&mut s);
                s.append(&chain_id);
                s.append(&0u8);
                s.append(&0u8);
            }
        }
        keccak(s.as_raw())
    }
}

/// Encodes a raw recovery id and an optional chain id into `v`.
pub fn add_chain_replay_protection(v: u8, chain_id: Option<u64>) -> u64 {
    v as u64
        + if let Some(n) = chain_id {
            35 + n * 2
        } else {
            27
        }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Nonce.
    pub nonce: U256,
    /// Gas price.
    pub gas_price: U256,
    /// Gas paid up front for transaction execution.
    pub gas: U256,
    /// Action, can be either call or contract create.
    pub action: Action,
    /// Transferred value.
    pub value: U256,
    /// Transaction data.
    pub data: Bytes,
}

impl Transaction {
    /// Total charge against the sender's balance,
    /// `value + gas_price * gas`.
    pub fn cost(&self) -> U256 {
        self.value
            .saturating_add(self.gas_price.saturating_mul(self.gas))
    }

    pub fn sign(
        self, secret: &Secret, chain_id: Option<u64>,
    ) -> SignedTransaction {
        let signer = chain_id.map_or(Signer::Legacy, Signer::ChainId);
        let sig = keylib::sign(secret, &signer.signature_hash(&self))
            .expect("data is valid and context has signing capabilities; qed");
        let tx_with_sig = self.with_signature(sig, chain_id);
        let public = tx_with_sig
            .recover_public()
            .expect("secret is valid so it's recoverable");
        SignedTransaction::new(public, tx_with_sig)
    }

    /// Seals the transaction with a signature produced over the matching
    /// signer digest.
    pub fn with_signature(
        self, sig: Signature, chain_id: Option<u64>,
    ) -> TransactionWithSignature {
        TransactionWithSignature {
            unsigned: self,
            r: sig.r().into(),
            s: sig.s().into(),
            v: add_chain_replay_protection(sig.v(), chain_id),
            hash: H256::zero(),
            rlp_size: None,
        }
        .compute_hash()
    }

    /// Appends the six unsigned fields, without a list header.
    fn rlp_append_unsigned(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        s.append(&self.action);
        s.append(&self.value);
        s.append(&self.data);
    }
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        self.rlp_append_unsigned(s);
    }
}

impl Decodable for Transaction {
    fn decode(r: &Rlp) -> Result<Self, DecoderError> {
        Ok(Transaction {
            nonce: r.val_at(0)?,
            gas_price: r.val_at(1)?,
            gas: r.val_at(2)?,
            action: r.val_at(3)?,
            value: r.val_at(4)?,
            data: r.val_at(5)?,
        })
    }
}

/// Signed transaction information without verified signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithSignature {
    /// Plain Transaction.
    pub unsigned: Transaction,
    /// The V field of the signature; carries the recovery id and, for
    /// replay-protected transactions, the chain id.
    pub v: u64,
    /// The R field of the signature; helps describe the point on the curve.
    pub r: U256,
    /// The S field of the signature; helps describe the point on the curve.
    pub s: U256,
    /// Hash of the transaction.
    pub hash: H256,
    /// The transaction size when serialized in rlp.
    pub rlp_size: Option<usize>,
}

impl Deref for TransactionWithSignature {
    type Target = Transaction;

    fn deref(&self) -> &Self::Target { &self.unsigned }
}

impl Decodable for TransactionWithSignature {
    fn decode(d: &Rlp) -> Result<Self, DecoderError> {
        if d.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let hash = keccak(d.as_raw());
        let rlp_size = Some(d.as_raw().len());

        Ok(TransactionWithSignature {
            unsigned: Transaction {
                nonce: d.val_at(0)?,
                gas_price: d.val_at(1)?,
                gas: d.val_at(2)?,
                action: d.val_at(3)?,
                value: d.val_at(4)?,
                data: d.val_at(5)?,
            },
            v: d.val_at(6)?,
            r: d.val_at(7)?,
            s: d.val_at(8)?,
            hash,
            rlp_size,
        })
    }
}

impl Encodable for TransactionWithSignature {
    fn rlp_append(&self, s: &mut RlpStream) {
        self.rlp_append_sealed_transaction(s)
    }
}

impl TransactionWithSignature {
    /// Used to compute hash of created transactions.
    fn compute_hash(mut self) -> TransactionWithSignature {
        let hash = keccak(&*self.rlp_bytes());
        self.hash = hash;
        self
    }

    /// Checks whether signature is empty.
    pub fn is_unsigned(&self) -> bool { self.r.is_zero() && self.s.is_zero() }

    /// Whether `v` commits to a chain id.
    pub fn is_replay_protected(&self) -> bool {
        self.v != 27 && self.v != 28
    }

    /// The chain id the signature commits to, `None` for legacy
    /// signatures.
    pub fn chain_id(&self) -> Option<u64> {
        if self.is_replay_protected() && self.v >= 35 {
            Some((self.v - 35) / 2)
        } else {
            None
        }
    }

    /// Raw recovery id with replay protection stripped. Out-of-range
    /// values are rejected by signature recovery.
    fn standard_v(&self) -> u8 {
        let v = match self.chain_id() {
            Some(chain_id) => self.v.checked_sub(chain_id * 2 + 35),
            None => self.v.checked_sub(27),
        };
        v.filter(|v| *v <= 1).unwrap_or(4) as u8
    }

    /// Append object with a signature into RLP stream.
    fn rlp_append_sealed_transaction(&self, s: &mut RlpStream) {
        s.begin_list(9);
        self.unsigned.rlp_append_unsigned(s);
        s.append(&self.v);
        s.append(&self.r);
        s.append(&self.s);
    }

    /// Construct a signature object from the sig.
    pub fn signature(&self) -> Signature {
        Signature::from_rsv(
            &H256::from_uint(&self.r),
            &H256::from_uint(&self.s),
            self.standard_v(),
        )
    }

    /// Checks whether the signature has a low 's' value.
    pub fn check_low_s(&self) -> Result<(), keylib::Error> {
        if !self.signature().is_low_s() {
            Err(keylib::Error::InvalidSignature)
        } else {
            Ok(())
        }
    }

    pub fn hash(&self) -> H256 { self.hash }

    /// Recovers the public key of the sender through the signer the
    /// transaction was signed with.
    pub fn recover_public(&self) -> Result<Public, keylib::Error> {
        // Disallow unsigned transactions
        if self.is_unsigned() {
            return Err(keylib::Error::InvalidSignature);
        }
        self.check_low_s()?;

        let signer = Signer::for_transaction(self);
        Ok(recover(
            &self.signature(),
            &signer.signature_hash(&self.unsigned),
        )?)
    }

    pub fn rlp_size(&self) -> usize {
        self.rlp_size.unwrap_or_else(|| self.rlp_bytes().len())
    }
}

/// A signed transaction with successfully recovered `sender`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: TransactionWithSignature,
    pub sender: Address,
    pub public: Option<Public>,
}

impl Deref for SignedTransaction {
    type Target = TransactionWithSignature;

    fn deref(&self) -> &Self::Target { &self.transaction }
}

impl From<SignedTransaction> for TransactionWithSignature {
    fn from(tx: SignedTransaction) -> Self { tx.transaction }
}

impl SignedTransaction {
    pub fn new(public: Public, transaction: TransactionWithSignature) -> Self {
        if transaction.is_unsigned() {
            SignedTransaction {
                transaction,
                sender: UNSIGNED_SENDER,
                public: None,
            }
        } else {
            let sender = public_to_address(&public);
            SignedTransaction {
                transaction,
                sender,
                public: Some(public),
            }
        }
    }

    /// Returns transaction sender.
    pub fn sender(&self) -> Address { self.sender }

    pub fn nonce(&self) -> U256 { self.transaction.nonce }

    /// Checks if signature is empty.
    pub fn is_unsigned(&self) -> bool { self.transaction.is_unsigned() }

    pub fn hash(&self) -> H256 { self.transaction.hash() }

    pub fn gas(&self) -> &U256 { &self.transaction.gas }

    pub fn gas_price(&self) -> &U256 { &self.transaction.gas_price }

    pub fn gas_limit(&self) -> &U256 { &self.transaction.gas }

    pub fn rlp_size(&self) -> usize { self.transaction.rlp_size() }

    pub fn public(&self) -> &Option<Public> { &self.public }
}

#[cfg(test)]
mod tests {
    use super::{Action, Signer, Transaction, TransactionWithSignature};
    use axm_types::{Address, U256};
    use keylib::{Generator, Random};

    fn new_unsigned_tx(to: Option<Address>) -> Transaction {
        Transaction {
            nonce: 5.into(),
            gas_price: 1.into(),
            gas: 21000.into(),
            action: to.map_or(Action::Create, Action::Call),
            value: 100.into(),
            data: Vec::new(),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let sender = Random.generate().unwrap();
        let to = Address::from_low_u64_be(0xbeef);
        let signed =
            new_unsigned_tx(Some(to)).sign(sender.secret(), Some(1));

        let encoded = rlp::encode(&signed.transaction);
        let decoded: TransactionWithSignature =
            rlp::decode(&encoded).expect("decoding failure");

        assert_eq!(decoded.unsigned, signed.transaction.unsigned);
        assert_eq!(
            (decoded.v, decoded.r, decoded.s),
            (signed.v, signed.r, signed.s)
        );
        assert_eq!(decoded.hash(), signed.hash());
        assert_eq!(decoded.rlp_size(), encoded.len());
    }

    #[test]
    fn legacy_signature_recovers_sender() {
        let sender = Random.generate().unwrap();
        let signed = new_unsigned_tx(None).sign(sender.secret(), None);

        assert!(!signed.is_replay_protected());
        assert_eq!(signed.chain_id(), None);
        assert!(signed.v == 27 || signed.v == 28);
        assert_eq!(signed.sender(), sender.address());
    }

    #[test]
    fn protected_signature_recovers_sender() {
        let sender = Random.generate().unwrap();
        let to = Address::from_low_u64_be(0xbeef);
        let signed =
            new_unsigned_tx(Some(to)).sign(sender.secret(), Some(1));

        assert!(signed.is_replay_protected());
        assert_eq!(signed.chain_id(), Some(1));
        assert!(signed.v == 37 || signed.v == 38);
        assert_eq!(signed.sender(), sender.address());
    }

    #[test]
    fn signer_digests_differ_per_chain() {
        let tx = new_unsigned_tx(Some(Address::from_low_u64_be(1)));
        let legacy = Signer::Legacy.signature_hash(&tx);
        let chain_1 = Signer::ChainId(1).signature_hash(&tx);
        let chain_2 = Signer::ChainId(2).signature_hash(&tx);
        assert_ne!(legacy, chain_1);
        assert_ne!(chain_1, chain_2);
    }

    #[test]
    fn tampered_payload_recovers_different_sender() {
        let sender = Random.generate().unwrap();
        let signed = new_unsigned_tx(None).sign(sender.secret(), None);

        let mut tampered = signed.transaction.clone();
        tampered.unsigned.value = 101.into();
        match tampered.recover_public() {
            Ok(public) => assert_ne!(Some(public), signed.public),
            Err(_) => {}
        }
    }

    #[test]
    fn wrong_item_count_is_rejected() {
        let tx = new_unsigned_tx(None);
        let encoded = rlp::encode(&tx);
        assert!(rlp::decode::<TransactionWithSignature>(&encoded).is_err());
    }

    #[test]
    fn contract_creation_encodes_empty_recipient() {
        let sender = Random.generate().unwrap();
        let signed = new_unsigned_tx(None).sign(sender.secret(), Some(7));
        let encoded = rlp::encode(&signed.transaction);
        let decoded: TransactionWithSignature =
            rlp::decode(&encoded).expect("decoding failure");
        assert_eq!(decoded.action, Action::Create);
    }

    #[test]
    fn cost_covers_value_and_gas() {
        let tx = new_unsigned_tx(Some(Address::from_low_u64_be(1)));
        assert_eq!(tx.cost(), U256::from(100 + 21000));
    }
}
