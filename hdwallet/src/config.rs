use serde::{Deserialize, Serialize};

/// Wallet tuning knobs. Hosts usually deserialize this from their own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Account used when a facade call does not name one.
    pub default_account: u32,
    /// Upper bound on cached derived nodes; 0 turns the cache off.
    pub cache_capacity: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        WalletConfig {
            default_account: 0,
            cache_capacity: 64,
        }
    }
}

impl WalletConfig {
    pub fn with_default_account(mut self, account: u32) -> Self {
        self.default_account = account;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn without_cache(self) -> Self {
        self.with_cache_capacity(0)
    }
}
