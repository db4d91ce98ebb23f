//! Library side of the `bids-cli` binary: configuration, logging and the
//! run summary.

pub mod config;
pub mod logging;
pub mod summary;
