//! Short human-typable codes used to move a watchlist between devices.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Upper-case letters and digits without `I`, `O`, `0` and `1`.
pub const SYNC_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of freshly minted codes.
pub const SYNC_CODE_LENGTH: usize = 6;

/// How long a code keeps resolving after it was registered.
pub const SYNC_CODE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const MIN_ACCEPTED_LENGTH: usize = 4;
const MAX_ACCEPTED_LENGTH: usize = 16;

/// A canonical (upper-cased) sync code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncCode(String);

impl SyncCode {
    /// Mint a new random code from [`SYNC_CODE_ALPHABET`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..SYNC_CODE_LENGTH)
            .map(|_| char::from(SYNC_CODE_ALPHABET[rng.gen_range(0..SYNC_CODE_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Normalize a presented code: trimmed, upper-cased, 4-16 ASCII
    /// alphanumerics. Codes typed from other sources are not required to
    /// stay within the minting alphabet.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(Error::InvalidInput("sync code must not be empty".to_string()));
        }
        if !(MIN_ACCEPTED_LENGTH..=MAX_ACCEPTED_LENGTH).contains(&code.len()) {
            return Err(Error::InvalidInput(format!(
                "sync code must be {MIN_ACCEPTED_LENGTH}-{MAX_ACCEPTED_LENGTH} characters"
            )));
        }
        if !code.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(Error::InvalidInput(
                "sync code must only contain letters and digits".to_string(),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SyncCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SyncCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SyncCode> for String {
    fn from(value: SyncCode) -> Self {
        value.0
    }
}
