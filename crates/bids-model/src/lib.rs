//! Core types shared by the BIDS conversion crates.
//!
//! A converted scan [`Series`] is classified into a [`Category`] and a
//! [`Disposition`]; eligible series later receive a [`RunNumber`] and a
//! canonical name under a [`SubjectId`]/[`SessionLabel`] pair.

pub mod category;
pub mod disposition;
pub mod error;
pub mod ids;
pub mod options;
pub mod series;

pub use category::Category;
pub use disposition::{
    ClassifiedSeries, DiscardReason, Disposition, FieldMapRole, Label, SequencedSeries,
};
pub use error::ModelError;
pub use ids::{RunNumber, SessionLabel, SubjectId};
pub use options::{AnatomicalEligibility, PatternEntry, PatternTable, PipelineOptions};
pub use series::{AcquisitionTime, ImageTypeTags, Series, SeriesFile, SidecarMetadata};
