//! In-memory storage for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use pinexam_core::error::StorageError;
use pinexam_core::journal::{JournalRecord, Pin};
use pinexam_core::model::{CourseConfig, CourseRef};
use pinexam_core::results::{LockOutcome, ResultRecord, ResultSet, WriteOutcome};
use pinexam_core::traits::{ConfigSource, JournalStore, ResultStore};
use pinexam_core::validator::parse_course_config;

#[derive(Default)]
struct State {
    courses: HashMap<(String, String), CourseConfig>,
    journals: HashMap<Pin, JournalRecord>,
    results: HashMap<Pin, ResultRecord>,
}

/// Implements all three accessors over maps guarded by a single mutex.
///
/// Every check-and-write runs under that mutex, which makes the result
/// writes atomic with respect to each other.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }

    /// Register an already parsed course.
    pub fn insert_course(
        &self,
        course: &str,
        language: &str,
        config: CourseConfig,
    ) -> Result<(), StorageError> {
        self.state()?
            .courses
            .insert((course.to_string(), language.to_string()), config);
        Ok(())
    }

    /// Validate and register a course document.
    pub fn insert_course_json(
        &self,
        course: &str,
        language: &str,
        doc: &Value,
    ) -> Result<(), StorageError> {
        let config = parse_course_config(doc)?;
        self.insert_course(course, language, config)
    }

    /// Registered courses, sorted by name then language.
    pub fn list_courses(&self) -> Result<Vec<CourseRef>, StorageError> {
        let mut courses: Vec<CourseRef> = self
            .state()?
            .courses
            .keys()
            .map(|(name, language)| CourseRef {
                name: name.clone(),
                language: language.clone(),
            })
            .collect();
        courses.sort_by(|a, b| (&a.name, &a.language).cmp(&(&b.name, &b.language)));
        Ok(courses)
    }
}

#[async_trait]
impl ConfigSource for MemoryStore {
    async fn get(&self, course: &str, language: &str) -> Result<CourseConfig, StorageError> {
        self.state()?
            .courses
            .get(&(course.to_string(), language.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("course {course}/{language}")))
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn get(&self, pin: Pin) -> Result<Option<JournalRecord>, StorageError> {
        Ok(self.state()?.journals.get(&pin).cloned())
    }

    async fn put(&self, pin: Pin, record: &JournalRecord) -> Result<(), StorageError> {
        self.state()?.journals.insert(pin, record.clone());
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn get(&self, pin: Pin) -> Result<Option<ResultRecord>, StorageError> {
        Ok(self.state()?.results.get(&pin).cloned())
    }

    async fn put_unless_locked(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
    ) -> Result<WriteOutcome, StorageError> {
        let mut state = self.state()?;
        let record = state.results.entry(pin).or_default();
        if record.is_locked() {
            return Ok(WriteOutcome::Locked(record.clone()));
        }
        record.tests = tests;
        Ok(WriteOutcome::Written)
    }

    async fn lock(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
        code: String,
    ) -> Result<LockOutcome, StorageError> {
        let mut state = self.state()?;
        let record = state.results.entry(pin).or_default();
        if record.is_locked() {
            return Ok(LockOutcome::AlreadyLocked(record.clone()));
        }
        record.tests = tests;
        record.validation_code = Some(code);
        Ok(LockOutcome::Locked(record.clone()))
    }
}
