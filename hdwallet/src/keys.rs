//! Leaf keys handed to signing code. Plain copies, detached from the wallet.

use crate::curve;
use secp256k1::SecretKey;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(curve::public_from_secret(&self.0))
    }

    pub fn as_secret_key(&self) -> &SecretKey {
        &self.0
    }
}

impl From<SecretKey> for PrivateKey {
    fn from(secret: SecretKey) -> Self {
        PrivateKey(secret)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// secp256k1 public key, rendered as its compressed hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; curve::COMPRESSED_POINT_LEN] {
        curve::compress(&self.0)
    }

    pub fn as_point(&self) -> &secp256k1::PublicKey {
        &self.0
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(point: secp256k1::PublicKey) -> Self {
        PublicKey(point)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}
