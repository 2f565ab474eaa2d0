//! Stateful workflows over the storage accessors.
//!
//! The engine functions are pure; this service wires them to the three
//! accessors and owns the random source. The lock invariant is enforced by
//! the result store's conditional writes, so concurrent `update` and `lock`
//! calls for one pin cannot change results that already carry a code.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::calculator::ResultCalculator;
use crate::code::generate_validation_code;
use crate::error::{ServiceError, StorageError};
use crate::journal::{Answer, Journal, JournalRecord, Pin};
use crate::model::{CourseConfig, CourseRef};
use crate::report::ResultSheet;
use crate::results::{LockOutcome, ResultRecord, ResultSet, WriteOutcome};
use crate::structure::{build_structure, MinimalStructure};
use crate::traits::{ConfigSource, JournalStore, ResultStore};

/// A journal loaded together with what it was built from.
#[derive(Debug, Clone)]
pub struct LoadedJournal {
    pub pin: Pin,
    pub record: JournalRecord,
    pub config: CourseConfig,
    pub journal: Journal,
}

/// The assessment workflows: start, resume, answer, update and lock.
pub struct AssessmentService {
    configs: Arc<dyn ConfigSource>,
    journals: Arc<dyn JournalStore>,
    results: Arc<dyn ResultStore>,
    calculator: ResultCalculator,
    rng: Mutex<StdRng>,
}

impl AssessmentService {
    pub fn new(
        configs: Arc<dyn ConfigSource>,
        journals: Arc<dyn JournalStore>,
        results: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            configs,
            journals,
            results,
            calculator: ResultCalculator::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a deterministic random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_calculator(mut self, calculator: ResultCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new journal for `course` in `language` under a fresh pin.
    pub async fn start(&self, course: &str, language: &str) -> Result<LoadedJournal, ServiceError> {
        let config = self.configs.get(course, language).await?;

        let pin = loop {
            let candidate = Pin::generate(&mut *self.rng());
            if self.journals.get(candidate).await?.is_none() {
                break candidate;
            }
            tracing::debug!(pin = %candidate, "pin already taken, drawing again");
        };

        let structure = build_structure(&config, None, &mut *self.rng())?;
        let journal = Journal::new(structure);
        let record = JournalRecord {
            course: CourseRef {
                name: course.to_string(),
                language: language.to_string(),
            },
            structure: MinimalStructure::from(&journal.structure),
            log: journal.log.clone(),
            started_at: Utc::now(),
        };
        self.journals.put(pin, &record).await?;

        tracing::info!(
            pin = %pin,
            course = %record.course,
            tests = journal.structure.test_count(),
            "started journal"
        );
        Ok(LoadedJournal {
            pin,
            record,
            config,
            journal,
        })
    }

    /// Rebuild the journal of `pin` from its persisted minimal structure.
    pub async fn resume(&self, pin: Pin) -> Result<LoadedJournal, ServiceError> {
        let record = self
            .journals
            .get(pin)
            .await?
            .ok_or(ServiceError::UnknownPin(pin))?;
        let config = self
            .configs
            .get(&record.course.name, &record.course.language)
            .await?;

        // Resume draws nothing from the generator.
        let mut unused = StdRng::seed_from_u64(0);
        let structure = build_structure(&config, Some(&record.structure), &mut unused)?;
        let journal = Journal {
            structure,
            log: record.log.clone(),
        };
        Ok(LoadedJournal {
            pin,
            record,
            config,
            journal,
        })
    }

    /// Record the answer to `test` in `set`.
    pub async fn record_answer(
        &self,
        pin: Pin,
        set: &str,
        test: &str,
        answer: Answer,
    ) -> Result<(), ServiceError> {
        let mut loaded = self.resume(pin).await?;
        if self.is_locked(pin).await? {
            return Err(ServiceError::AlreadyLocked { pin });
        }
        if loaded.journal.structure.test(set, test).is_none() {
            return Err(ServiceError::UnknownTest {
                set: set.to_string(),
                test: test.to_string(),
            });
        }

        loaded.record.log.record(set, test, answer);
        self.journals.put(pin, &loaded.record).await?;
        tracing::debug!(pin = %pin, set, test, "recorded answer");
        Ok(())
    }

    /// Recompute and store the results of `pin`.
    ///
    /// Fails with [`ServiceError::AlreadyLocked`] once a validation code
    /// exists; the stored results are left untouched.
    pub async fn update(&self, pin: Pin) -> Result<Vec<ResultSet>, ServiceError> {
        let loaded = self.resume(pin).await?;
        let tests = self.calculator.calculate(&loaded.config, &loaded.journal)?;

        match self.results.put_unless_locked(pin, tests.clone()).await? {
            WriteOutcome::Written => {
                tracing::info!(pin = %pin, sets = tests.len(), "updated results");
                Ok(tests)
            }
            WriteOutcome::Locked(_) => {
                tracing::warn!(pin = %pin, "update rejected, results are locked");
                Err(ServiceError::AlreadyLocked { pin })
            }
        }
    }

    /// Freeze the results of `pin` and return its validation code.
    ///
    /// Idempotent: a pin that already carries a code gets that code back and
    /// its results are not recomputed.
    pub async fn lock(&self, pin: Pin) -> Result<String, ServiceError> {
        if let Some(code) = self
            .results
            .get(pin)
            .await?
            .and_then(|record| record.validation_code)
        {
            return Ok(code);
        }

        let loaded = self.resume(pin).await?;
        let tests = self.calculator.calculate(&loaded.config, &loaded.journal)?;
        let code = generate_validation_code(
            &loaded.config.validation_schema_template,
            &mut *self.rng(),
        );

        let outcome = self.results.lock(pin, tests, code).await?;
        if let LockOutcome::AlreadyLocked(_) = &outcome {
            tracing::info!(pin = %pin, "lock raced with another caller, keeping stored code");
        } else {
            tracing::info!(pin = %pin, "locked results");
        }
        outcome.into_record().validation_code.ok_or_else(|| {
            ServiceError::Storage(StorageError::InvalidFormat(format!(
                "locked result record for pin {pin} has no validation code"
            )))
        })
    }

    /// The stored results of `pin`; empty when none were computed yet.
    pub async fn results(&self, pin: Pin) -> Result<ResultRecord, ServiceError> {
        Ok(self.results.get(pin).await?.unwrap_or_default())
    }

    /// Build the result sheet of `pin` from its journal and stored results.
    pub async fn result_sheet(&self, pin: Pin) -> Result<ResultSheet, ServiceError> {
        let loaded = self.resume(pin).await?;
        let record = self.results(pin).await?;
        Ok(ResultSheet::new(
            pin,
            loaded.config.title.clone(),
            &loaded.journal.structure,
            record,
        ))
    }

    async fn is_locked(&self, pin: Pin) -> Result<bool, ServiceError> {
        Ok(self
            .results
            .get(pin)
            .await?
            .is_some_and(|record| record.is_locked()))
    }
}
