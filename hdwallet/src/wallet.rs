//! HD wallet facade: a seed, its root node, and path-based key lookups.

use crate::codec;
use crate::config::WalletConfig;
use crate::derivation::{DerivationPath, PathStep};
use crate::error::{Bip32Error, Result};
use crate::extended_key::ExtendedKey;
use crate::keys::{PrivateKey, PublicKey};
use crate::registry::{Change, CoinType, HdVersion, Purpose};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, trace};
use zeroize::Zeroize;

struct Seed(Vec<u8>);

impl Drop for Seed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

type CacheKey = ([u8; 4], DerivationPath);

#[derive(Default)]
struct CacheEntries {
    nodes: HashMap<CacheKey, ExtendedKey>,
    order: VecDeque<CacheKey>,
}

/// Bounded side table of derived nodes, keyed by root fingerprint and path.
/// Oldest entries are evicted first.
struct DerivationCache {
    capacity: usize,
    entries: RwLock<CacheEntries>,
}

impl DerivationCache {
    fn new(capacity: usize) -> Self {
        DerivationCache {
            capacity,
            entries: RwLock::new(CacheEntries::default()),
        }
    }

    /// Deepest cached ancestor of `path` (or the node itself), with its depth.
    fn closest(&self, root: [u8; 4], path: &DerivationPath) -> Option<(usize, ExtendedKey)> {
        let entries = self.entries.read();
        (1..=path.len()).rev().find_map(|len| {
            let prefix = path.prefix(len)?;
            entries
                .nodes
                .get(&(root, prefix))
                .map(|node| (len, node.clone()))
        })
    }

    fn insert(&self, root: [u8; 4], path: DerivationPath, node: ExtendedKey) {
        let mut entries = self.entries.write();
        let key = (root, path);
        if entries.nodes.contains_key(&key) {
            return;
        }
        while entries.order.len() >= self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.nodes.remove(&oldest);
                }
                None => break,
            }
        }
        entries.order.push_back(key.clone());
        entries.nodes.insert(key, node);
    }

    /// Wipes every cached private node and empties the table.
    fn erase(&self) {
        let mut entries = self.entries.write();
        for node in entries.nodes.values_mut() {
            node.erase_secrets();
        }
        entries.nodes.clear();
        entries.order.clear();
    }
}

/// Hierarchical deterministic wallet over secp256k1.
///
/// Derived keys are returned as independent values; the wallet itself is
/// never mutated apart from its internal cache, so it can be shared across
/// threads behind an `Arc`.
pub struct HdWallet {
    seed: Seed,
    root: ExtendedKey,
    root_fingerprint: [u8; 4],
    config: WalletConfig,
    cache: Option<DerivationCache>,
}

impl HdWallet {
    pub fn new(seed: &[u8]) -> Result<Self> {
        Self::with_config(seed, WalletConfig::default())
    }

    pub fn with_config(seed: &[u8], config: WalletConfig) -> Result<Self> {
        let root = ExtendedKey::master(seed)?;
        let root_fingerprint = root.fingerprint();
        let cache =
            (config.cache_capacity > 0).then(|| DerivationCache::new(config.cache_capacity));
        debug!(
            root = %hex::encode(root_fingerprint),
            cache_capacity = config.cache_capacity,
            "HD wallet created"
        );
        Ok(HdWallet {
            seed: Seed(seed.to_vec()),
            root,
            root_fingerprint,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn root_fingerprint(&self) -> [u8; 4] {
        self.root_fingerprint
    }

    /// The master extended public key.
    pub fn root_public(&self) -> ExtendedKey {
        self.root.to_public()
    }

    /// The extended private node at `path`.
    pub fn derive(&self, path: &DerivationPath) -> Result<ExtendedKey> {
        let (start, mut node) = match self
            .cache
            .as_ref()
            .and_then(|cache| cache.closest(self.root_fingerprint, path))
        {
            Some((len, node)) => {
                trace!(%path, cached_depth = len, "derivation cache hit");
                (len, node)
            }
            None => {
                trace!(%path, "derivation cache miss");
                (0, self.root.clone())
            }
        };

        for (offset, &step) in path.steps()[start..].iter().enumerate() {
            node = node.derive_child(step).inspect_err(|e| {
                debug!(%path, error = %e, "derivation failed");
            })?;
            if let (Some(cache), Some(prefix)) = (&self.cache, path.prefix(start + offset + 1)) {
                cache.insert(self.root_fingerprint, prefix, node.clone());
            }
        }
        Ok(node)
    }

    /// Private key at `path`.
    pub fn get_key(&self, path: &DerivationPath) -> Result<PrivateKey> {
        let node = self.derive(path)?;
        node.private_key()
            .map(PrivateKey::from)
            .ok_or(Bip32Error::InvalidKeyData)
    }

    /// Private key at `m/purpose'/coin'/account'/change/address`.
    pub fn get_key_for(
        &self,
        purpose: Purpose,
        coin: CoinType,
        account: u32,
        change: Change,
        address: u32,
    ) -> Result<PrivateKey> {
        self.get_key(&DerivationPath::bip44(purpose, coin, account, change, address)?)
    }

    pub fn get_public_key(&self, path: &DerivationPath) -> Result<PublicKey> {
        Ok(self.derive(path)?.public_key().into())
    }

    /// Account-level extended public key for the configured default account.
    pub fn get_extended_public_key(
        &self,
        purpose: Purpose,
        coin: CoinType,
        version: HdVersion,
    ) -> Result<String> {
        let account = self.config.default_account;
        self.get_extended_public_key_for_account(purpose, coin, account, version)
    }

    /// Extended public key of `m/purpose'/coin'/account'`.
    pub fn get_extended_public_key_for_account(
        &self,
        purpose: Purpose,
        coin: CoinType,
        account: u32,
        version: HdVersion,
    ) -> Result<String> {
        let node = self.account_node(purpose, coin, account)?;
        Ok(codec::encode(&node.to_public(), version))
    }

    pub fn get_extended_private_key(
        &self,
        purpose: Purpose,
        coin: CoinType,
        version: HdVersion,
    ) -> Result<String> {
        let account = self.config.default_account;
        self.get_extended_private_key_for_account(purpose, coin, account, version)
    }

    pub fn get_extended_private_key_for_account(
        &self,
        purpose: Purpose,
        coin: CoinType,
        account: u32,
        version: HdVersion,
    ) -> Result<String> {
        let node = self.account_node(purpose, coin, account)?;
        Ok(codec::encode(&node, version))
    }

    fn account_node(&self, purpose: Purpose, coin: CoinType, account: u32) -> Result<ExtendedKey> {
        let path = DerivationPath::for_account(purpose, coin, account)?;
        debug!(%path, ?purpose, coin = coin.index(), "deriving account node");
        self.derive(&path)
    }

    /// Private key at `change/address` below an account-level extended private key.
    pub fn private_key_from_extended(
        extended: &str,
        version: HdVersion,
        change: Change,
        address: u32,
    ) -> Result<PrivateKey> {
        let account = codec::decode_as(extended, version)?;
        if !account.is_private() {
            return Err(Bip32Error::InvalidKeyData);
        }
        let leaf = derive_change_address(&account, change, address)?;
        leaf.private_key()
            .map(PrivateKey::from)
            .ok_or(Bip32Error::InvalidKeyData)
    }

    /// Public key at `change/address` below an account-level extended key.
    /// Works from either half of the version pair.
    pub fn public_key_from_extended(
        extended: &str,
        version: HdVersion,
        change: Change,
        address: u32,
    ) -> Result<PublicKey> {
        let account = codec::decode_as(extended, version)?.to_public();
        Ok(derive_change_address(&account, change, address)?
            .public_key()
            .into())
    }
}

fn derive_change_address(
    account: &ExtendedKey,
    change: Change,
    address: u32,
) -> Result<ExtendedKey> {
    account
        .derive_child(PathStep::normal(change.index())?)?
        .derive_child(PathStep::normal(address)?)
}

impl Drop for HdWallet {
    fn drop(&mut self) {
        self.root.erase_secrets();
        if let Some(cache) = &self.cache {
            cache.erase();
        }
    }
}

impl fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdWallet")
            .field("seed", &format_args!("<{} bytes>", self.seed.0.len()))
            .field("root_fingerprint", &hex::encode(self.root_fingerprint))
            .field("config", &self.config)
            .finish()
    }
}
