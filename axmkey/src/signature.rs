// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Error, Message, Public, Secret, SECP256K1};
use axm_types::{H256, H520};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message as SecpMessage, SecretKey,
};
use std::{cmp::PartialEq, fmt, ops::Deref, str::FromStr};

/// Half of the secp256k1 curve order; signatures with a larger `s` are
/// malleable and rejected.
const HALF_CURVE_ORDER: H256 = H256([
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d,
    0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
]);

/// An ECDSA signature serialized as `r || s || v`, where `v` is the raw
/// recovery id (0 or 1).
#[derive(Clone, Copy)]
pub struct Signature([u8; 65]);

impl Signature {
    /// The R component.
    pub fn r(&self) -> &[u8] { &self.0[0..32] }

    /// The S component.
    pub fn s(&self) -> &[u8] { &self.0[32..64] }

    /// The recovery id.
    pub fn v(&self) -> u8 { self.0[64] }

    /// Constructs a signature from its components.
    pub fn from_rsv(r: &H256, s: &H256, v: u8) -> Signature {
        let mut sig = [0u8; 65];
        sig[0..32].copy_from_slice(r.as_bytes());
        sig[32..64].copy_from_slice(s.as_bytes());
        sig[64] = v;
        Signature(sig)
    }

    /// Whether the S component is in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        H256::from_slice(self.s()) <= HALF_CURVE_ORDER
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool { self.0[..] == other.0[..] }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Signature")
            .field("r", &H256::from_slice(self.r()))
            .field("s", &H256::from_slice(self.s()))
            .field("v", &self.v())
            .finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", H520::from(*self))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H520::from_str(s)
            .map(Into::into)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl Deref for Signature {
    type Target = [u8; 65];

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl From<Signature> for H520 {
    fn from(s: Signature) -> Self { H520(s.0) }
}

impl From<H520> for Signature {
    fn from(h: H520) -> Self { Signature(h.0) }
}

/// Signs a 32-byte digest with the given secret key.
pub fn sign(secret: &Secret, message: &Message) -> Result<Signature, Error> {
    let context = &SECP256K1;
    let sec = SecretKey::from_slice(secret.as_bytes())?;
    let s = context.sign_ecdsa_recoverable(
        &SecpMessage::from_digest(message.to_fixed_bytes()),
        &sec,
    );
    let (rec_id, data) = s.serialize_compact();
    let mut data_arr = [0u8; 65];
    data_arr[0..64].copy_from_slice(&data[0..64]);
    data_arr[64] = rec_id.to_i32() as u8;
    Ok(Signature(data_arr))
}

/// Recovers the public key that produced `signature` over `message`.
pub fn recover(
    signature: &Signature, message: &Message,
) -> Result<Public, Error> {
    let context = &SECP256K1;
    let rsig = RecoverableSignature::from_compact(
        &signature[0..64],
        RecoveryId::from_i32(signature.v() as i32)?,
    )?;
    let publ = context.recover_ecdsa(
        &SecpMessage::from_digest(message.to_fixed_bytes()),
        &rsig,
    )?;
    let serialized = publ.serialize_uncompressed();
    let mut public = Public::zero();
    public.as_bytes_mut().copy_from_slice(&serialized[1..65]);
    Ok(public)
}

/// Checks that `signature` over `message` was produced by `public`.
pub fn verify_public(
    public: &Public, signature: &Signature, message: &Message,
) -> Result<bool, Error> {
    Ok(&recover(signature, message)? == public)
}
