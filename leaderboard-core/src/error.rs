use thiserror::Error;

/// Failures that abort a ranking run.
///
/// `NoData` is the only expected one; callers map it to a "no active
/// students" response. Everything else is an unexpected failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankingError {
    #[error("No active students found")]
    NoData,

    #[error("Duplicate participant ID: {0}")]
    DuplicateParticipant(String),
}

/// Why an override payload could not be used. Never escapes a single record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("event details are not valid JSON: {0}")]
    InvalidJson(String),

    #[error("customPoints is not a number")]
    NonNumeric,
}
