//! Filesystem storage.
//!
//! Layout:
//!
//! ```text
//! <courses_dir>/<course>/<language>.json   course documents (read only)
//! <data_dir>/journals/<pin>.json           journal records
//! <data_dir>/results/<pin>.json            result records
//! ```
//!
//! Records are written to a temporary file in the target directory and
//! renamed into place. Result writes hold an exclusive OS file lock on
//! `<data_dir>/results/<pin>.lock` across the read-check-write sequence, so
//! the lock invariant also holds between separate processes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use pinexam_core::error::StorageError;
use pinexam_core::journal::{JournalRecord, Pin};
use pinexam_core::model::{CourseConfig, CourseRef};
use pinexam_core::results::{LockOutcome, ResultRecord, ResultSet, WriteOutcome};
use pinexam_core::traits::{ConfigSource, JournalStore, ResultStore};
use pinexam_core::validator::parse_course_config;

/// JSON files under a courses directory and a data directory.
pub struct FileStore {
    courses_dir: PathBuf,
    data_dir: PathBuf,
}

impl FileStore {
    /// Directories are created lazily on the first write.
    pub fn new(courses_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            courses_dir: courses_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn courses_dir(&self) -> &Path {
        &self.courses_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn course_path(&self, course: &str, language: &str) -> Result<PathBuf, StorageError> {
        for part in [course, language] {
            if !is_plain_name(part) {
                return Err(StorageError::NotFound(format!("course {course}/{language}")));
            }
        }
        Ok(self.courses_dir.join(course).join(format!("{language}.json")))
    }

    fn journal_path(&self, pin: Pin) -> PathBuf {
        self.data_dir.join("journals").join(format!("{pin}.json"))
    }

    fn result_path(&self, pin: Pin) -> PathBuf {
        self.data_dir.join("results").join(format!("{pin}.json"))
    }

    fn result_lock_path(&self, pin: Pin) -> PathBuf {
        self.data_dir.join("results").join(format!("{pin}.lock"))
    }

    /// Run `update` on the stored result record of `pin` while holding the
    /// pin's exclusive file lock. Blocking work runs off the async runtime.
    async fn with_result_lock<T, F>(&self, pin: Pin, update: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Path, Option<ResultRecord>) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.result_path(pin);
        let lock_path = self.result_lock_path(pin);
        tokio::task::spawn_blocking(move || {
            let _lock = acquire_lock(&lock_path)?;
            let current = load_record(&path)?;
            update(&path, current)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("result write task failed: {e}")))?
    }

    /// Read a course document without validating it.
    pub fn read_course_document(
        &self,
        course: &str,
        language: &str,
    ) -> Result<Value, StorageError> {
        let path = self.course_path(course, language)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("course {course}/{language}")));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| StorageError::InvalidFormat(format!("{}: {e}", path.display())))
    }

    /// Every `<course>/<language>.json` pair under the courses directory,
    /// sorted by course then language.
    pub fn list_courses(&self) -> Result<Vec<CourseRef>, StorageError> {
        let mut courses = Vec::new();
        if !self.courses_dir.is_dir() {
            return Ok(courses);
        }

        for entry in std::fs::read_dir(&self.courses_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            for doc in std::fs::read_dir(entry.path())? {
                let path = doc?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    if let Some(language) = path.file_stem() {
                        courses.push(CourseRef {
                            name: name.clone(),
                            language: language.to_string_lossy().into_owned(),
                        });
                    }
                }
            }
        }

        courses.sort_by(|a, b| (&a.name, &a.language).cmp(&(&b.name, &b.language)));
        Ok(courses)
    }
}

fn is_plain_name(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    decode_record(path, tokio::fs::read_to_string(path).await)
}

fn load_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    decode_record(path, std::fs::read_to_string(path))
}

fn decode_record<T: DeserializeOwned>(
    path: &Path,
    read: std::io::Result<String>,
) -> Result<Option<T>, StorageError> {
    let content = match read {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::InvalidFormat(format!("{}: {e}", path.display())))
}

/// Open `path` and block until an exclusive lock on it is held. The lock is
/// released when the returned file is dropped.
fn acquire_lock(path: &Path) -> Result<File, StorageError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    fs2::FileExt::lock_exclusive(&file).map_err(|e| {
        StorageError::Unavailable(format!("failed to lock {}: {e}", path.display()))
    })?;
    Ok(file)
}

/// Write `value` as pretty JSON and atomically move it to `path`.
fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::Unavailable(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::InvalidFormat(format!("failed to serialize record: {e}")))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl ConfigSource for FileStore {
    async fn get(&self, course: &str, language: &str) -> Result<CourseConfig, StorageError> {
        let doc = self.read_course_document(course, language)?;
        let config = parse_course_config(&doc)?;
        tracing::debug!(course, language, "loaded course");
        Ok(config)
    }
}

#[async_trait]
impl JournalStore for FileStore {
    async fn get(&self, pin: Pin) -> Result<Option<JournalRecord>, StorageError> {
        read_record(&self.journal_path(pin)).await
    }

    async fn put(&self, pin: Pin, record: &JournalRecord) -> Result<(), StorageError> {
        write_record(&self.journal_path(pin), record)
    }
}

#[async_trait]
impl ResultStore for FileStore {
    async fn get(&self, pin: Pin) -> Result<Option<ResultRecord>, StorageError> {
        read_record(&self.result_path(pin)).await
    }

    async fn put_unless_locked(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
    ) -> Result<WriteOutcome, StorageError> {
        self.with_result_lock(pin, move |path, current| {
            let mut record = current.unwrap_or_default();
            if record.is_locked() {
                return Ok(WriteOutcome::Locked(record));
            }
            record.tests = tests;
            write_record(path, &record)?;
            Ok(WriteOutcome::Written)
        })
        .await
    }

    async fn lock(
        &self,
        pin: Pin,
        tests: Vec<ResultSet>,
        code: String,
    ) -> Result<LockOutcome, StorageError> {
        self.with_result_lock(pin, move |path, current| {
            if let Some(existing) = current.filter(ResultRecord::is_locked) {
                return Ok(LockOutcome::AlreadyLocked(existing));
            }
            let record = ResultRecord {
                tests,
                validation_code: Some(code),
            };
            write_record(path, &record)?;
            Ok(LockOutcome::Locked(record))
        })
        .await
    }
}
