use crypto_utils::Base58Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Bip32Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Bip32Error {
    #[error("seed must be 16 to 64 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("seed produced an invalid master key")]
    InvalidMasterKey,

    // `index` in the child derivation errors is the full child number,
    // hardened bit included.
    #[error("cannot derive hardened child {index:#010x} from a public key")]
    HardenedFromPublicKey { index: u32 },

    #[error("child {index:#010x} yields an invalid key")]
    InvalidChildKey { index: u32 },

    #[error("cannot derive child {index:#010x} below depth 255")]
    DepthOverflow { index: u32 },

    #[error("malformed derivation path {path:?}: {reason}")]
    MalformedPath { path: String, reason: &'static str },

    #[error("extended key checksum mismatch")]
    ChecksumMismatch,

    #[error("extended key has invalid length {0}, expected a 78 byte payload")]
    InvalidLength(usize),

    #[error("invalid base58 character {0:?}")]
    InvalidBase58(char),

    #[error("invalid key data")]
    InvalidKeyData,

    #[error("inconsistent extended key metadata: {0}")]
    InvalidMetadata(&'static str),

    #[error("unknown extended key version {}", hex::encode(.0))]
    UnknownVersion([u8; 4]),
}

impl Bip32Error {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        Bip32Error::MalformedPath {
            path: path.to_owned(),
            reason,
        }
    }
}

impl From<Base58Error> for Bip32Error {
    fn from(e: Base58Error) -> Self {
        match e {
            Base58Error::InvalidCharacter(c) => Bip32Error::InvalidBase58(c),
            Base58Error::TooShort(len) => Bip32Error::InvalidLength(len),
            Base58Error::ChecksumMismatch => Bip32Error::ChecksumMismatch,
        }
    }
}
