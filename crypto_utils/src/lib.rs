//! Hashing and encoding helpers shared by the HD wallet crates.

pub mod base58;
pub mod hash;
pub mod hmac;

pub use base58::Base58Error;
