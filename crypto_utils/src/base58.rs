//! Base58 and Base58Check with the Bitcoin alphabet.

use crate::hash::sha256d;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base58Error {
    #[error("invalid base58 character {0:?}")]
    InvalidCharacter(char),

    #[error("decoded data is {0} bytes, too short to carry a checksum")]
    TooShort(usize),

    #[error("base58check checksum mismatch")]
    ChecksumMismatch,
}

pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const CHECKSUM_LEN: usize = 4;

fn digit_value(c: char) -> Result<u32, Base58Error> {
    if !c.is_ascii() {
        return Err(Base58Error::InvalidCharacter(c));
    }
    ALPHABET
        .iter()
        .position(|&a| a == c as u8)
        .map(|p| p as u32)
        .ok_or(Base58Error::InvalidCharacter(c))
}

pub fn encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|&&b| b == 0).count();

    // Base58 digits, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for &byte in &data[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat_n('1', zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

pub fn decode(s: &str) -> Result<Vec<u8>, Base58Error> {
    let zeros = s.bytes().take_while(|&b| b == b'1').count();

    // Output bytes, least significant first.
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.chars().skip(zeros) {
        let mut carry = digit_value(c)?;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    bytes.extend(std::iter::repeat_n(0u8, zeros));
    bytes.reverse();
    Ok(bytes)
}

/// Appends the first four bytes of `sha256d(payload)` and encodes the result.
pub fn check_encode(payload: &[u8]) -> String {
    let mut buf = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&sha256d(payload)[..CHECKSUM_LEN]);
    encode(&buf)
}

/// Decodes `s` and strips the trailing checksum after verifying it.
pub fn check_decode(s: &str) -> Result<Vec<u8>, Base58Error> {
    let mut raw = decode(s)?;
    if raw.len() < CHECKSUM_LEN {
        return Err(Base58Error::TooShort(raw.len()));
    }
    let payload_len = raw.len() - CHECKSUM_LEN;
    if sha256d(&raw[..payload_len])[..CHECKSUM_LEN] != raw[payload_len..] {
        return Err(Base58Error::ChecksumMismatch);
    }
    raw.truncate(payload_len);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[0x61]), "2g");
        assert_eq!(encode(&[0x62, 0x62, 0x62]), "a3gV");
        assert_eq!(encode(&[0x63, 0x63, 0x63]), "aPEr");
        assert_eq!(encode(b"hello world"), "StV1DL6CwTryKyV");
        assert_eq!(decode("Ldp").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode("StV1DL6CwTryKyV").unwrap(), b"hello world");
    }

    #[test]
    fn leading_zeros_map_to_ones() {
        assert_eq!(encode(&[0]), "1");
        assert_eq!(encode(&[0, 0, 1]), "112");
        assert_eq!(encode(&[0, 0, 0, 0, 0, 1]), "111112");
        assert_eq!(decode("1115T").unwrap(), vec![0, 0, 0, 1, 2]);
        assert_eq!(decode("5T").unwrap(), vec![1, 2]);
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert_eq!(decode("4P1e!"), Err(Base58Error::InvalidCharacter('!')));
        assert_eq!(decode("0OIl"), Err(Base58Error::InvalidCharacter('0')));
        assert_eq!(decode("2é"), Err(Base58Error::InvalidCharacter('é')));
    }

    #[test]
    fn check_roundtrip_including_empty_payload() {
        for payload in [&b""[..], b"a", b"Hello, World!", &[0, 0, 7]] {
            let encoded = check_encode(payload);
            assert_eq!(check_decode(&encoded).unwrap(), payload);
        }
    }

    #[test]
    fn check_decode_detects_corruption() {
        let mut encoded = check_encode(b"Hello, World!").into_bytes();
        let last = encoded.len() - 1;
        encoded[last] = if encoded[last] == b'2' { b'3' } else { b'2' };
        let encoded = String::from_utf8(encoded).unwrap();
        assert_eq!(check_decode(&encoded), Err(Base58Error::ChecksumMismatch));
    }

    #[test]
    fn check_decode_too_short() {
        assert_eq!(check_decode(""), Err(Base58Error::TooShort(0)));
        assert_eq!(check_decode("2g"), Err(Base58Error::TooShort(1)));
    }
}
