use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid subject id '{0}': expected a non-empty alphanumeric value")]
    InvalidSubjectId(String),
    #[error("invalid session label '{0}': expected ses-NNN")]
    InvalidSessionLabel(String),
    #[error("invalid session index {0}: indexes start at 1")]
    InvalidSessionIndex(u32),
    #[error("invalid run number {0}: runs start at 1 and render with two digits")]
    InvalidRunNumber(u32),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}
