#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

const SUBJECT_PREFIX: &str = "sub-";
const SESSION_PREFIX: &str = "ses-";

/// Subject identifier as given on the command line (without the `sub-` prefix).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix(SUBJECT_PREFIX).unwrap_or(trimmed);
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ModelError::InvalidSubjectId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory and file-name label, e.g. `sub-53888`.
    pub fn label(&self) -> String {
        format!("{SUBJECT_PREFIX}{}", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for SubjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// 1-based session ordinal, rendered as `ses-001`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SessionLabel(u32);

impl SessionLabel {
    pub fn from_index(index: u32) -> Result<Self, ModelError> {
        if index == 0 || index > 999 {
            return Err(ModelError::InvalidSessionIndex(index));
        }
        Ok(Self(index))
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SESSION_PREFIX}{:03}", self.0)
    }
}

impl FromStr for SessionLabel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidSessionLabel(s.to_string());
        let digits = s.trim().strip_prefix(SESSION_PREFIX).ok_or_else(invalid)?;
        if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let index: u32 = digits.parse().map_err(|_| invalid())?;
        Self::from_index(index).map_err(|_| invalid())
    }
}

/// 1-based run number within a grouping key, rendered zero-padded to two digits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RunNumber(u32);

impl RunNumber {
    pub const MAX: u32 = 99;

    pub fn new(value: u32) -> Result<Self, ModelError> {
        if value == 0 || value > Self::MAX {
            return Err(ModelError::InvalidRunNumber(value));
        }
        Ok(Self(value))
    }

    /// Run number for a zero-based rank in acquisition order.
    pub fn from_rank(rank: usize) -> Result<Self, ModelError> {
        let value = u32::try_from(rank + 1).unwrap_or(u32::MAX);
        Self::new(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RunNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}
