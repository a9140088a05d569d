use crate::curve;
use crate::derivation::{DerivationPath, PathStep};
use crate::error::{Bip32Error, Result};
use crypto_utils::hash::hash160;
use crypto_utils::hmac::{hmac_sha512, split_halves};
use secp256k1::{PublicKey, SecretKey};
use tracing::trace;
use zeroize::Zeroize;

/// HMAC key for the master node.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

/// The key carried by a node of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

/// A node of the BIP32 tree: key, chain code and lineage metadata.
///
/// Values are immutable once built; every derivation returns a new node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedKey {
    pub key: KeyMaterial,
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    /// Raw child number; hardened children have the top bit set.
    pub child_index: u32,
}

impl ExtendedKey {
    /// Master extended private key from a seed
    pub fn master(seed: &[u8]) -> Result<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(Bip32Error::InvalidSeedLength(seed.len()));
        }
        let (il, chain_code) = split_halves(&hmac_sha512(MASTER_HMAC_KEY, &[seed]));
        let secret = curve::secret_from_bytes(&il).ok_or(Bip32Error::InvalidMasterKey)?;
        Ok(ExtendedKey {
            key: KeyMaterial::Private(secret),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
        })
    }

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyMaterial::Private(_))
    }

    pub fn private_key(&self) -> Option<SecretKey> {
        match self.key {
            KeyMaterial::Private(secret) => Some(secret),
            KeyMaterial::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            KeyMaterial::Private(secret) => curve::public_from_secret(secret),
            KeyMaterial::Public(point) => *point,
        }
    }

    /// HASH160 of the compressed public key.
    pub fn identifier(&self) -> [u8; 20] {
        hash160(&curve::compress(&self.public_key()))
    }

    /// What children of this node carry as their parent fingerprint.
    pub fn fingerprint(&self) -> [u8; 4] {
        curve::fingerprint(&self.public_key())
    }

    /// The same node with the private key stripped (N() in BIP32).
    pub fn to_public(&self) -> Self {
        ExtendedKey {
            key: KeyMaterial::Public(self.public_key()),
            ..self.clone()
        }
    }

    pub fn child_step(&self) -> PathStep {
        PathStep::from_u32(self.child_index)
    }

    /// CKDpriv for private nodes, CKDpub for public ones.
    pub fn derive_child(&self, step: PathStep) -> Result<Self> {
        let child_index = step.to_u32();
        let index_bytes = child_index.to_be_bytes();
        let parent_public = self.public_key();

        let output = match (&self.key, step.is_hardened()) {
            (KeyMaterial::Public(_), true) => {
                return Err(Bip32Error::HardenedFromPublicKey { index: child_index });
            }
            // 0x00 || ser256(k_par) || ser32(i)
            (KeyMaterial::Private(secret), true) => {
                let mut secret_bytes = secret.secret_bytes();
                let out = hmac_sha512(
                    &self.chain_code,
                    &[&[0u8][..], &secret_bytes[..], &index_bytes[..]],
                );
                secret_bytes.zeroize();
                out
            }
            // serP(K_par) || ser32(i)
            (_, false) => hmac_sha512(
                &self.chain_code,
                &[&curve::compress(&parent_public)[..], &index_bytes[..]],
            ),
        };

        let depth = self
            .depth
            .checked_add(1)
            .ok_or(Bip32Error::DepthOverflow { index: child_index })?;

        let (il, chain_code) = split_halves(&output);
        let invalid = || Bip32Error::InvalidChildKey { index: child_index };
        let key = match &self.key {
            KeyMaterial::Private(secret) => {
                KeyMaterial::Private(curve::add_scalar(secret, &il).ok_or_else(invalid)?)
            }
            KeyMaterial::Public(point) => {
                KeyMaterial::Public(curve::add_point(point, &il).ok_or_else(invalid)?)
            }
        };

        trace!(depth, child = %step, private = self.is_private(), "derived child key");

        Ok(ExtendedKey {
            key,
            chain_code,
            depth,
            parent_fingerprint: curve::fingerprint(&parent_public),
            child_index,
        })
    }

    /// Overwrites the private scalar and chain code in place. The node is
    /// unusable for derivation afterwards.
    pub(crate) fn erase_secrets(&mut self) {
        if let KeyMaterial::Private(secret) = &mut self.key {
            secret.non_secure_erase();
        }
        self.chain_code.zeroize();
    }

    /// Walks every step of `path` from this node. The first failure is returned as is.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.steps()
            .iter()
            .try_fold(self.clone(), |node, &step| node.derive_child(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::HARDENED_OFFSET;
    use hex_literal::hex;

    const SEED: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    fn normal(i: u32) -> PathStep {
        PathStep::normal(i).unwrap()
    }

    fn hardened(i: u32) -> PathStep {
        PathStep::hardened(i).unwrap()
    }

    #[test]
    fn master_node_metadata() {
        let m = ExtendedKey::master(&SEED).unwrap();
        assert!(m.is_private());
        assert_eq!(m.depth, 0);
        assert_eq!(m.parent_fingerprint, [0u8; 4]);
        assert_eq!(m.child_index, 0);
        assert_eq!(
            m.chain_code,
            hex!("873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508")
        );
        assert_eq!(
            m.private_key().unwrap().secret_bytes(),
            hex!("e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35")
        );
        assert_eq!(m.fingerprint(), hex!("3442193e"));
    }

    #[test]
    fn master_is_deterministic() {
        assert_eq!(
            ExtendedKey::master(&SEED).unwrap(),
            ExtendedKey::master(&SEED).unwrap()
        );
    }

    #[test]
    fn invalid_seed_length() {
        for len in [0, 15, 65, 128] {
            assert_eq!(
                ExtendedKey::master(&vec![7u8; len]).unwrap_err(),
                Bip32Error::InvalidSeedLength(len)
            );
        }
        assert!(ExtendedKey::master(&[7u8; 16]).is_ok());
        assert!(ExtendedKey::master(&[7u8; 64]).is_ok());
    }

    #[test]
    fn child_metadata_tracks_parent() {
        let m = ExtendedKey::master(&SEED).unwrap();
        let child = m.derive_child(hardened(0)).unwrap();
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_fingerprint, m.fingerprint());
        assert_eq!(child.child_index, 0x8000_0000);
        assert_eq!(child.child_step(), hardened(0));
        let grandchild = child.derive_child(normal(1)).unwrap();
        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.parent_fingerprint, hex!("5c1bd648"));
    }

    #[test]
    fn hardened_from_public_fails() {
        let xpub = ExtendedKey::master(&SEED).unwrap().to_public();
        assert_eq!(
            xpub.derive_child(hardened(5)).unwrap_err(),
            Bip32Error::HardenedFromPublicKey {
                index: HARDENED_OFFSET + 5
            }
        );
    }

    #[test]
    fn public_derivation_matches_private() {
        let m = ExtendedKey::master(&SEED).unwrap();
        let account = m.derive_child(hardened(0)).unwrap();
        for i in [0, 1, 2, 1_000_000_000] {
            let via_private = account.derive_child(normal(i)).unwrap().to_public();
            let via_public = account.to_public().derive_child(normal(i)).unwrap();
            assert_eq!(via_private, via_public);
        }
    }

    #[test]
    fn depth_overflow() {
        let mut deep = ExtendedKey::master(&SEED).unwrap();
        deep.depth = 255;
        assert_eq!(
            deep.derive_child(normal(7)).unwrap_err(),
            Bip32Error::DepthOverflow { index: 7 }
        );
        assert_eq!(
            deep.to_public().derive_child(normal(7)).unwrap_err(),
            Bip32Error::DepthOverflow { index: 7 }
        );
        assert_eq!(
            deep.derive_child(hardened(7)).unwrap_err(),
            Bip32Error::DepthOverflow {
                index: HARDENED_OFFSET + 7
            }
        );
        deep.depth = 254;
        assert_eq!(deep.derive_child(normal(0)).unwrap().depth, 255);
    }

    #[test]
    fn derive_path_stops_at_first_error() {
        let xpub = ExtendedKey::master(&SEED).unwrap().to_public();
        let path: DerivationPath = "m/0/1/2'/3".parse().unwrap();
        assert_eq!(
            xpub.derive_path(&path).unwrap_err(),
            Bip32Error::HardenedFromPublicKey {
                index: HARDENED_OFFSET + 2
            }
        );
    }

    #[test]
    fn erase_secrets_clears_scalar_and_chain_code() {
        let mut m = ExtendedKey::master(&SEED).unwrap();
        let before = m.private_key().unwrap().secret_bytes();
        m.erase_secrets();
        assert_ne!(m.private_key().unwrap().secret_bytes(), before);
        assert_eq!(m.chain_code, [0u8; 32]);
    }

    #[test]
    fn derive_path_equals_stepwise_derivation() {
        let m = ExtendedKey::master(&SEED).unwrap();
        let path: DerivationPath = "m/0'/1/2'".parse().unwrap();
        let stepwise = m
            .derive_child(hardened(0))
            .and_then(|k| k.derive_child(normal(1)))
            .and_then(|k| k.derive_child(hardened(2)))
            .unwrap();
        assert_eq!(m.derive_path(&path).unwrap(), stepwise);
        assert_eq!(stepwise.depth, 3);
    }
}
