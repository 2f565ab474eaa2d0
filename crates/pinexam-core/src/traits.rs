//! Storage accessor traits.
//!
//! The engine never touches storage directly; the service talks to these
//! three accessors, implemented by the `pinexam-store` crate.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::journal::{JournalRecord, Pin};
use crate::model::CourseConfig;
use crate::results::{LockOutcome, ResultRecord, ResultSet, WriteOutcome};

// ---------------------------------------------------------------------------
// Course configurations
// ---------------------------------------------------------------------------

/// Source of validated course configurations.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Load the configuration of `course` in `language`.
    ///
    /// Fails with [`StorageError::NotFound`] when no such document exists.
    async fn get(&self, course: &str, language: &str) -> Result<CourseConfig, StorageError>;
}

// ---------------------------------------------------------------------------
// Journals
// ---------------------------------------------------------------------------

/// Persistence for journals, keyed by pin.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn get(&self, pin: Pin) -> Result<Option<JournalRecord>, StorageError>;

    async fn put(&self, pin: Pin, record: &JournalRecord) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Persistence for results, keyed by pin.
///
/// Both writes check the lock state and write within one critical section:
/// once a validation code is stored, the results of that pin never change.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn get(&self, pin: Pin) -> Result<Option<ResultRecord>, StorageError>;

    /// Replace the results of `pin` unless the record is locked.
    async fn put_unless_locked(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
    ) -> Result<WriteOutcome, StorageError>;

    /// Store `tests` together with `code` unless the record is already
    /// locked, in which case the stored record is returned untouched.
    async fn lock(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
        code: String,
    ) -> Result<LockOutcome, StorageError>;
}
