//! secp256k1 operations needed by BIP32, on top of the `secp256k1` crate.
//!
//! Every function here is total over its inputs and reports an unusable
//! result with `None`; callers know which index or field was involved and
//! turn that into the matching error.

use crypto_utils::hash::hash160;
use secp256k1::{All, PublicKey, SECP256K1, Scalar, Secp256k1, SecretKey};

pub const COMPRESSED_POINT_LEN: usize = 33;

fn context() -> &'static Secp256k1<All> {
    SECP256K1
}

/// Parses a big-endian scalar in `1..n`.
pub fn secret_from_bytes(bytes: &[u8; 32]) -> Option<SecretKey> {
    SecretKey::from_slice(bytes).ok()
}

/// `k·G`
pub fn public_from_secret(secret: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(context(), secret)
}

/// `(k + tweak) mod n`. `None` if the tweak is not below `n` or the sum is zero.
pub fn add_scalar(secret: &SecretKey, tweak: &[u8; 32]) -> Option<SecretKey> {
    let tweak = Scalar::from_be_bytes(*tweak).ok()?;
    secret.add_tweak(&tweak).ok()
}

/// `tweak·G + P`. `None` if the tweak is not below `n` or the sum is the point at infinity.
pub fn add_point(point: &PublicKey, tweak: &[u8; 32]) -> Option<PublicKey> {
    let tweak = Scalar::from_be_bytes(*tweak).ok()?;
    point.add_exp_tweak(context(), &tweak).ok()
}

/// Parses a 33-byte SEC1 compressed point.
pub fn parse_compressed(bytes: &[u8]) -> Option<PublicKey> {
    match bytes.first() {
        Some(0x02 | 0x03) if bytes.len() == COMPRESSED_POINT_LEN => {
            PublicKey::from_slice(bytes).ok()
        }
        _ => None,
    }
}

pub fn compress(point: &PublicKey) -> [u8; COMPRESSED_POINT_LEN] {
    point.serialize()
}

/// First four bytes of HASH160 of the compressed point.
pub fn fingerprint(point: &PublicKey) -> [u8; 4] {
    let id = hash160(&point.serialize());
    [id[0], id[1], id[2], id[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // secp256k1 group order
    const N: [u8; 32] = hex!("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141");
    const N_MINUS_1: [u8; 32] =
        hex!("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140");

    fn one() -> [u8; 32] {
        let mut b = [0u8; 32];
        b[31] = 1;
        b
    }

    #[test]
    fn scalar_range_is_enforced() {
        assert!(secret_from_bytes(&[0u8; 32]).is_none());
        assert!(secret_from_bytes(&N).is_none());
        assert!(secret_from_bytes(&N_MINUS_1).is_some());
        assert!(secret_from_bytes(&one()).is_some());
    }

    #[test]
    fn generator_compresses_to_known_point() {
        let g = public_from_secret(&secret_from_bytes(&one()).unwrap());
        assert_eq!(
            compress(&g),
            hex!("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
        );
    }

    #[test]
    fn scalar_and_point_addition_agree() {
        let k = secret_from_bytes(&hex!(
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        ))
        .unwrap();
        let tweak = hex!("0000000000000000000000000000000000000000000000000000000000000007");
        let by_scalar = public_from_secret(&add_scalar(&k, &tweak).unwrap());
        let by_point = add_point(&public_from_secret(&k), &tweak).unwrap();
        assert_eq!(by_scalar, by_point);
    }

    #[test]
    fn out_of_range_tweak_and_zero_sum_are_rejected() {
        let one = secret_from_bytes(&one()).unwrap();
        assert!(add_scalar(&one, &N).is_none());
        // 1 + (n - 1) = 0 mod n
        assert!(add_scalar(&one, &N_MINUS_1).is_none());
        // G + (n - 1)·G = infinity
        assert!(add_point(&public_from_secret(&one), &N_MINUS_1).is_none());
    }

    #[test]
    fn parse_compressed_only() {
        let g = compress(&public_from_secret(&secret_from_bytes(&one()).unwrap()));
        assert!(parse_compressed(&g).is_some());
        let mut bad_prefix = g;
        bad_prefix[0] = 0x04;
        assert!(parse_compressed(&bad_prefix).is_none());
        assert!(parse_compressed(&g[..32]).is_none());
        assert!(parse_compressed(&[]).is_none());
    }
}
