use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// SHA-256 applied twice, used for Base58Check checksums.
pub fn sha256d(input: &[u8]) -> [u8; 32] {
    sha256(&sha256(input))
}

pub fn ripemd160(input: &[u8]) -> [u8; 20] {
    Ripemd160::digest(input).into()
}

/// RIPEMD-160 of SHA-256. Key identifiers and fingerprints are built from this.
pub fn hash160(input: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn sha256_known_answers() {
        assert_eq!(
            sha256(b""),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(
            sha256(b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn sha256d_known_answers() {
        assert_eq!(
            sha256d(b""),
            hex!("5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456")
        );
        assert_eq!(
            sha256d(b"hello"),
            hex!("9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50")
        );
    }

    #[test]
    fn ripemd160_known_answers() {
        assert_eq!(ripemd160(b""), hex!("9c1185a5c5e9fc54612808977ee8f548b2258d31"));
        assert_eq!(
            ripemd160(b"message digest"),
            hex!("5d0689ef49d2fae572b881b123a85ffa21595f36")
        );
    }

    // Identifier of the BIP32 test vector 1 master public key.
    #[test]
    fn hash160_of_master_pubkey() {
        let pubkey = hex!("0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2");
        assert_eq!(
            hash160(&pubkey),
            hex!("3442193e1bb70916e914552172cd4e2dbc9df811")
        );
    }
}
