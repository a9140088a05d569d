use crate::error::{Bip32Error, Result};
use crate::registry::{Change, CoinType, Purpose};
use std::fmt;
use std::str::FromStr;

/// Index offset for hardened children (index >= 0x80000000) i.e., 0x80000000 = 2³¹
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One level of a derivation path: a 31-bit index plus the hardened flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathStep {
    index: u32,
    hardened: bool,
}

impl PathStep {
    pub fn new(index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Bip32Error::MalformedPath {
                path: index.to_string(),
                reason: "index must be below 2^31",
            });
        }
        Ok(PathStep { index, hardened })
    }

    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    /// Splits a raw BIP32 child number into index and hardened flag.
    pub fn from_u32(child_number: u32) -> Self {
        PathStep {
            index: child_number & !HARDENED_OFFSET,
            hardened: child_number & HARDENED_OFFSET != 0,
        }
    }

    /// Child number as serialized: hardened flag in the top bit.
    pub fn to_u32(self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn is_hardened(self) -> bool {
        self.hardened
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A BIP-32 derivation path (e.g., "m/44'/0'/0'/0/1"). Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<PathStep>);

impl DerivationPath {
    pub fn from_steps(steps: Vec<PathStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Bip32Error::malformed("m", "path has no steps"));
        }
        Ok(DerivationPath(steps))
    }

    /// `m/purpose'/coin'/account'`
    pub fn for_account(purpose: Purpose, coin: CoinType, account: u32) -> Result<Self> {
        Ok(DerivationPath(vec![
            PathStep::hardened(purpose.index())?,
            PathStep::hardened(coin.index())?,
            PathStep::hardened(account)?,
        ]))
    }

    /// `m/purpose'/coin'/account'/change/address`
    pub fn bip44(
        purpose: Purpose,
        coin: CoinType,
        account: u32,
        change: Change,
        address: u32,
    ) -> Result<Self> {
        Ok(Self::for_account(purpose, coin, account)?
            .child(PathStep::normal(change.index())?)
            .child(PathStep::normal(address)?))
    }

    /// This path extended by one step.
    pub fn child(mut self, step: PathStep) -> Self {
        self.0.push(step);
        self
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `len` steps, or `None` when `len` is zero or past the end.
    pub fn prefix(&self, len: usize) -> Option<DerivationPath> {
        if len == 0 || len > self.0.len() {
            return None;
        }
        Some(DerivationPath(self.0[..len].to_vec()))
    }

    fn level(&self, depth: usize) -> Option<u32> {
        self.0.get(depth).map(|s| s.index)
    }

    pub fn purpose(&self) -> Option<u32> {
        self.level(0)
    }

    pub fn coin(&self) -> Option<u32> {
        self.level(1)
    }

    pub fn account(&self) -> Option<u32> {
        self.level(2)
    }

    pub fn change(&self) -> Option<u32> {
        self.level(3)
    }

    pub fn address(&self) -> Option<u32> {
        self.level(4)
    }
}

fn parse_segment(path: &str, segment: &str) -> Result<PathStep> {
    let (digits, hardened) = match segment.strip_suffix(['\'', 'h', 'H']) {
        Some(rest) => (rest, true),
        None => (segment, false),
    };
    if digits.is_empty() {
        return Err(Bip32Error::malformed(path, "empty segment"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Bip32Error::malformed(path, "index is not a decimal number"));
    }
    let index: u32 = digits
        .parse()
        .map_err(|_| Bip32Error::malformed(path, "index must be below 2^31"))?;
    if index >= HARDENED_OFFSET {
        return Err(Bip32Error::malformed(path, "index must be below 2^31"));
    }
    Ok(PathStep { index, hardened })
}

impl FromStr for DerivationPath {
    type Err = Bip32Error;

    /// Parses "m/44'/0'/0'/0/0". `h` and `H` are accepted in place of `'`.
    fn from_str(s: &str) -> Result<Self> {
        let path = s.trim();
        let mut segments = path.split('/');
        if segments.next() != Some("m") {
            return Err(Bip32Error::malformed(path, "path must start at the root 'm'"));
        }
        let steps = segments
            .map(|segment| parse_segment(path, segment))
            .collect::<Result<Vec<_>>>()?;
        if steps.is_empty() {
            return Err(Bip32Error::malformed(path, "path has no steps"));
        }
        Ok(DerivationPath(steps))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DerivationPath {
    type Item = PathStep;
    type IntoIter = std::vec::IntoIter<PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
