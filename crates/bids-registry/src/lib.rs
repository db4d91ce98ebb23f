#![deny(unsafe_code)]

//! Durable subject/session registry.
//!
//! The registry is a flat table of `(participant_id, session_id, mr_id)`
//! rows. Sessions are resolved read-only first and committed once the
//! session directory exists, so a registry row always implies an on-disk
//! session folder.

pub mod error;
pub mod registry;
pub mod store;

pub use crate::error::RegistryError;
pub use crate::registry::{Registry, SessionResolution};
pub use crate::store::{MemoryRegistryStore, RegistryRow, RegistryStore, TsvRegistryStore};
