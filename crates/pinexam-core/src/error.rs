//! Error types for the assessment engine.
//!
//! Library errors are `thiserror` enums so callers can match on the failure
//! kind; the CLI wraps them with `anyhow` context.

use std::fmt;

use thiserror::Error;

use crate::journal::Pin;

/// One structural problem found in a course document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value (e.g. `/tests/2/category`).
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// The first semantic problem found in a structurally valid document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticViolation {
    #[error("duplicate test id: {0}")]
    DuplicateTestId(String),

    #[error("test {test} ({category}) option {option} has no correct value")]
    MissingCorrectValue {
        test: String,
        category: String,
        option: usize,
    },

    #[error("duplicate test group id: {0}")]
    DuplicateGroupId(String),

    #[error("test group {group} references unknown test {test}")]
    UnknownGroupTest { group: String, test: String },

    #[error("test group {group} selects {select} of only {available} tests")]
    SelectExceedsGroup {
        group: String,
        select: usize,
        available: usize,
    },

    #[error("duplicate test set id: {0}")]
    DuplicateSetId(String),

    #[error("test set {set} references unknown test or group {element}")]
    UnknownSetElement { set: String, element: String },

    #[error("duplicate info page id: {0}")]
    DuplicateInfoPageId(String),

    #[error("info page {page} belongs to unknown test, group or set {owner}")]
    UnknownInfoPageOwner { page: String, owner: String },
}

impl SemanticViolation {
    /// Dangling id references form the referential-integrity subset.
    pub fn is_referential(&self) -> bool {
        matches!(
            self,
            SemanticViolation::UnknownGroupTest { .. }
                | SemanticViolation::UnknownSetElement { .. }
                | SemanticViolation::UnknownInfoPageOwner { .. }
        )
    }
}

/// A course document failed validation. Never partially accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{} structural violation(s): {}", .0.len(), join_violations(.0))]
    Structural(Vec<Violation>),

    #[error("semantic violation: {0}")]
    Semantic(SemanticViolation),
}

impl ValidationError {
    /// Whether the failure is a dangling reference.
    pub fn is_referential(&self) -> bool {
        match self {
            ValidationError::Semantic(v) => v.is_referential(),
            ValidationError::Structural(_) => false,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure to build a journal structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("test group {group} selects {select} of only {available} tests")]
    SelectionTooLarge {
        group: String,
        select: usize,
        available: usize,
    },

    #[error("test set {set} references unknown element {element}")]
    UnknownElement { set: String, element: String },

    #[error("test group {group} references unknown test {test}")]
    UnknownGroupTest { group: String, test: String },

    #[error("prior structure has no entry for test set {set}")]
    ResumeMismatch { set: String },
}

/// Failure of a scoring strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("scoring invoked without a test configuration")]
    ConfigMissing,
}

/// Data-integrity failure that aborts a whole result calculation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    #[error("structure references test {test} in set {set} but the course does not declare it")]
    MissingTestConfig { set: String, test: String },

    #[error("no log entry for evaluated test {test} in set {set}")]
    MissingLogEntry { set: String, test: String },

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Failure of a storage accessor. Surfaced unchanged by the service.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("stored data is corrupted or has an invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid course configuration: {0}")]
    InvalidCourse(#[from] ValidationError),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a stateful service workflow.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no journal for pin {0}")]
    UnknownPin(Pin),

    #[error("pin {pin} is locked; results are frozen")]
    AlreadyLocked { pin: Pin },

    #[error("test {test} is not part of set {set} in this journal")]
    UnknownTest { set: String, test: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
