//! Path prefixes and serialization versions of the common coins.
//!
//! These are plain values; looking up which purpose or version a given
//! coin should use is left to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BIP43 purpose field, the first level of a BIP44-style path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// BIP44, legacy P2PKH.
    Bip44,
    /// BIP49, P2WPKH nested in P2SH.
    Bip49,
    /// BIP84, native P2WPKH.
    Bip84,
    /// BIP86, single-key taproot.
    Bip86,
}

impl Purpose {
    pub fn index(self) -> u32 {
        match self {
            Purpose::Bip44 => 44,
            Purpose::Bip49 => 49,
            Purpose::Bip84 => 84,
            Purpose::Bip86 => 86,
        }
    }
}

/// SLIP-44 registered coin type, the second level of a BIP44-style path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinType(pub u32);

impl CoinType {
    pub const BITCOIN: CoinType = CoinType(0);
    pub const TESTNET: CoinType = CoinType(1);
    pub const LITECOIN: CoinType = CoinType(2);
    pub const DOGECOIN: CoinType = CoinType(3);
    pub const DASH: CoinType = CoinType(5);
    pub const ETHEREUM: CoinType = CoinType(60);
    pub const BITCOIN_CASH: CoinType = CoinType(145);

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Fourth level of a BIP44 path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Change {
    /// Receiving addresses.
    #[default]
    External,
    /// Change addresses.
    Internal,
}

impl Change {
    pub fn index(self) -> u32 {
        match self {
            Change::External => 0,
            Change::Internal => 1,
        }
    }
}

/// Version prefixes used when serializing extended keys for one coin/script type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HdVersion {
    pub private: [u8; 4],
    pub public: [u8; 4],
}

impl HdVersion {
    /// xprv / xpub
    pub const BITCOIN: HdVersion = HdVersion::new(0x0488_ade4, 0x0488_b21e);
    /// tprv / tpub
    pub const BITCOIN_TESTNET: HdVersion = HdVersion::new(0x0435_8394, 0x0435_87cf);
    /// yprv / ypub
    pub const BITCOIN_NESTED_SEGWIT: HdVersion = HdVersion::new(0x049d_7878, 0x049d_7cb2);
    /// zprv / zpub
    pub const BITCOIN_SEGWIT: HdVersion = HdVersion::new(0x04b2_430c, 0x04b2_4746);
    /// Ltpv / Ltub
    pub const LITECOIN: HdVersion = HdVersion::new(0x019d_9cfe, 0x019d_a462);
    /// Mtpv / Mtub
    pub const LITECOIN_SEGWIT: HdVersion = HdVersion::new(0x01b2_6792, 0x01b2_6ef6);
    /// dgpv / dgub
    pub const DOGECOIN: HdVersion = HdVersion::new(0x02fa_c398, 0x02fa_cafd);

    pub const fn new(private: u32, public: u32) -> Self {
        HdVersion {
            private: private.to_be_bytes(),
            public: public.to_be_bytes(),
        }
    }

    /// The half of the pair matching the kind of key being serialized.
    pub fn for_key(&self, is_private: bool) -> [u8; 4] {
        if is_private { self.private } else { self.public }
    }

    /// `Some(true)` for the private prefix, `Some(false)` for the public one.
    pub fn kind_of(&self, version: [u8; 4]) -> Option<bool> {
        if version == self.private {
            Some(true)
        } else if version == self.public {
            Some(false)
        } else {
            None
        }
    }

    pub fn contains(&self, version: [u8; 4]) -> bool {
        self.kind_of(version).is_some()
    }
}

impl fmt::Display for HdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            hex::encode(self.private),
            hex::encode(self.public)
        )
    }
}
