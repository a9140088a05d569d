use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 over the concatenation of `parts`.
///
/// Child derivation feeds the key material and the serialized index as
/// separate slices, so callers never have to build an intermediate buffer.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    // HMAC accepts keys of any length; `new_from_slice` cannot fail here.
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key).expect("HMAC takes any key size");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Splits a 64-byte HMAC output into its left and right 32-byte halves.
pub fn split_halves(output: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&output[..32]);
    right.copy_from_slice(&output[32..]);
    (left, right)
}
