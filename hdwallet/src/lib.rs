//! BIP32 hierarchical deterministic keys on secp256k1.
//!
//! - [`ExtendedKey`]: master and child derivation (CKDpriv / CKDpub)
//! - [`DerivationPath`]: `m/44'/0'/0'/0/0` style paths
//! - [`codec`]: Base58Check extended key (de)serialization
//! - [`HdWallet`]: seed-owning facade answering key-at-path queries

pub mod codec;
pub mod config;
pub mod curve;
pub mod derivation;
pub mod error;
pub mod extended_key;
pub mod keys;
pub mod registry;
pub mod wallet;

pub use config::WalletConfig;
pub use derivation::{DerivationPath, HARDENED_OFFSET, PathStep};
pub use error::{Bip32Error, Result};
pub use extended_key::{ExtendedKey, KeyMaterial};
pub use keys::{PrivateKey, PublicKey};
pub use registry::{Change, CoinType, HdVersion, Purpose};
pub use wallet::HdWallet;
