#![deny(unsafe_code)]

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("corrupt registry {location}: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("failed to read registry {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write registry {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock registry {location}: {source}")]
    Lock {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("source scan {scan_id} is already registered to {owner}")]
    ScanClaimed { scan_id: String, owner: String },

    #[error("registry for {subject} changed concurrently (expected next {expected}, found {found})")]
    Conflict {
        subject: String,
        expected: String,
        found: String,
    },

    #[error("{subject} has no session index left after {last}")]
    SessionLimit { subject: String, last: String },
}

impl RegistryError {
    pub(crate) fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
