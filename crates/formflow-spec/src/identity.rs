use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z]{3}[0-9]{2}$").expect("valid token pattern")
});

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
/// Alphabet of each token position.
const LAYOUT: [&[u8]; ApplicationId::LEN] = [
    LETTERS, LETTERS, DIGITS, DIGITS, LETTERS, LETTERS, LETTERS, DIGITS, DIGITS,
];

/// Opaque token addressing one application record, e.g. `AB12CDE34`.
///
/// The token never changes for the life of a record. Uniqueness is not
/// checked here; stores reject duplicates on create.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("'{0}' is not a valid application id, expected a token like AB12CDE34")]
    Malformed(String),
}

impl ApplicationId {
    pub const LEN: usize = 9;

    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Draws every position uniformly and independently from `rng`.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let token = LAYOUT
            .iter()
            .map(|alphabet| char::from(alphabet[rng.random_range(0..alphabet.len())]))
            .collect();
        Self(token)
    }

    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if TOKEN_PATTERN.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(IdentityError::Malformed(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = IdentityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ApplicationId> for String {
    fn from(value: ApplicationId) -> Self {
        value.0
    }
}

/// Lifecycle status of a stored application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Only drafts accept edits and saves.
    pub fn is_editable(self) -> bool {
        matches!(self, ApplicationStatus::Draft)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
