//! Error taxonomy for calendar interactions.
//!
//! Validation errors never reach the network. Lookup and persistence
//! failures carry the underlying cause for logging only; the user sees a
//! generic status message.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no active patient is selected")]
    NoActivePatient,
    #[error("search criteria are empty")]
    EmptySearchCriteria,
    #[error("no week slot at month {month_index}, week {week_index}")]
    SlotOutOfRange {
        month_index: usize,
        week_index: usize,
    },
    #[error("drag token is malformed")]
    MalformedToken,
    #[error("{0} is not allowed while {1}")]
    InvalidState(&'static str, &'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("patient lookup failed: {0}")]
    Lookup(String),
    #[error("visit persistence failed: {0}")]
    Persistence(String),
}

pub const SELECT_PATIENT_MESSAGE: &str = "Select a patient before recording a visit.";
pub const EMPTY_SEARCH_MESSAGE: &str = "Enter a name or patient number to search.";
pub const SEARCH_FAILED_MESSAGE: &str = "Patient search failed. Please try again.";
pub const NO_MATCH_MESSAGE: &str = "No patient matched the search.";
pub const VISIT_FAILED_MESSAGE: &str =
    "Failed to record visit. Check your connection or session and try again.";
pub const VISIT_LOAD_FAILED_MESSAGE: &str =
    "Could not load visits for this year. Check your connection or session.";
