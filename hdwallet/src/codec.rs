//! Base58Check serialization of extended keys.
//!
//! Payload layout (78 bytes, big-endian):
//!
//! ```text
//! version(4) | depth(1) | parent_fp(4) | child_index(4) | chain_code(32) | key_data(33)
//! ```
//!
//! Private key data is `0x00 || k`, public key data the compressed point.

use crate::curve;
use crate::error::{Bip32Error, Result};
use crate::extended_key::{ExtendedKey, KeyMaterial};
use crate::registry::HdVersion;
use crypto_utils::base58;

pub const PAYLOAD_LEN: usize = 78;

/// Longest Base58 rendering of a payload plus its 4-byte checksum.
/// Longer input is rejected before the quadratic base conversion runs.
pub const MAX_ENCODED_LEN: usize = 112;

pub fn encode(key: &ExtendedKey, version: HdVersion) -> String {
    let mut payload = Vec::with_capacity(PAYLOAD_LEN);
    payload.extend_from_slice(&version.for_key(key.is_private()));
    payload.push(key.depth);
    payload.extend_from_slice(&key.parent_fingerprint);
    payload.extend_from_slice(&key.child_index.to_be_bytes());
    payload.extend_from_slice(&key.chain_code);
    match &key.key {
        KeyMaterial::Private(secret) => {
            payload.push(0u8);
            payload.extend_from_slice(&secret.secret_bytes());
        }
        KeyMaterial::Public(point) => payload.extend_from_slice(&curve::compress(point)),
    }
    base58::check_encode(&payload)
}

/// Decodes any extended key and hands back its version bytes unchecked.
pub fn decode(s: &str) -> Result<(ExtendedKey, [u8; 4])> {
    let payload = unwrap_payload(s)?;
    let version = version_of(&payload);
    Ok((parse_body(&payload)?, version))
}

/// Decodes an extended key that must carry one of `version`'s prefixes,
/// with key material matching the prefix it carries.
pub fn decode_as(s: &str, version: HdVersion) -> Result<ExtendedKey> {
    let payload = unwrap_payload(s)?;
    let found = version_of(&payload);
    let expect_private = version
        .kind_of(found)
        .ok_or(Bip32Error::UnknownVersion(found))?;
    let key = parse_body(&payload)?;
    if key.is_private() != expect_private {
        return Err(Bip32Error::InvalidKeyData);
    }
    Ok(key)
}

fn unwrap_payload(s: &str) -> Result<[u8; PAYLOAD_LEN]> {
    if s.len() > MAX_ENCODED_LEN {
        return Err(Bip32Error::InvalidLength(s.len()));
    }
    let data = base58::check_decode(s)?;
    data.as_slice()
        .try_into()
        .map_err(|_| Bip32Error::InvalidLength(data.len()))
}

fn version_of(payload: &[u8; PAYLOAD_LEN]) -> [u8; 4] {
    [payload[0], payload[1], payload[2], payload[3]]
}

fn parse_body(payload: &[u8; PAYLOAD_LEN]) -> Result<ExtendedKey> {
    let depth = payload[4];
    let mut parent_fingerprint = [0u8; 4];
    parent_fingerprint.copy_from_slice(&payload[5..9]);
    let mut index_bytes = [0u8; 4];
    index_bytes.copy_from_slice(&payload[9..13]);
    let child_index = u32::from_be_bytes(index_bytes);
    if depth == 0 && parent_fingerprint != [0u8; 4] {
        return Err(Bip32Error::InvalidMetadata(
            "zero depth with non-zero parent fingerprint",
        ));
    }
    if depth == 0 && child_index != 0 {
        return Err(Bip32Error::InvalidMetadata("zero depth with non-zero index"));
    }

    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&payload[13..45]);

    let key_data = &payload[45..];
    let key = if key_data[0] == 0 {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&key_data[1..]);
        KeyMaterial::Private(curve::secret_from_bytes(&scalar).ok_or(Bip32Error::InvalidKeyData)?)
    } else {
        KeyMaterial::Public(curve::parse_compressed(key_data).ok_or(Bip32Error::InvalidKeyData)?)
    };

    Ok(ExtendedKey {
        key,
        chain_code,
        depth,
        parent_fingerprint,
        child_index,
    })
}

impl ExtendedKey {
    /// Serialize this key into a Base58Check string
    pub fn to_base58(&self, version: HdVersion) -> String {
        encode(self, version)
    }

    /// Deserialize a key of the given version family from a Base58Check string
    pub fn from_base58(s: &str, version: HdVersion) -> Result<Self> {
        decode_as(s, version)
    }
}
