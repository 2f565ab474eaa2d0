//! Scored results and their persisted form.

use serde::{Deserialize, Serialize};

use crate::scoring::Scored;

/// Outcome of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub score: u32,
    pub max_score: u32,
    #[serde(default)]
    pub correct: Vec<usize>,
    #[serde(default)]
    pub wrong: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<usize>,
}

impl TestResult {
    pub fn from_scored(id: impl Into<String>, scored: Scored) -> Self {
        Self {
            id: id.into(),
            score: scored.score,
            max_score: scored.max_score,
            correct: scored.correct,
            wrong: scored.wrong,
            skipped: scored.skipped,
        }
    }
}

/// The results of one test set, in structure order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub id: String,
    pub tests: Vec<TestResult>,
}

impl ResultSet {
    pub fn score(&self) -> u32 {
        self.tests.iter().map(|t| t.score).sum()
    }

    pub fn max_score(&self) -> u32 {
        self.tests.iter().map(|t| t.max_score).sum()
    }
}

/// What the result store holds for a pin. A present validation code marks
/// the record as locked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(default)]
    pub tests: Vec<ResultSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_code: Option<String>,
}

impl ResultRecord {
    pub fn is_locked(&self) -> bool {
        self.validation_code.is_some()
    }
}

/// Outcome of a conditional result write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The record was locked; nothing was written.
    Locked(ResultRecord),
}

/// Outcome of an attempt to lock a result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    /// This call stored its results and code.
    Locked(ResultRecord),
    /// Another caller locked first; the stored record is returned.
    AlreadyLocked(ResultRecord),
}

impl LockOutcome {
    pub fn record(&self) -> &ResultRecord {
        match self {
            LockOutcome::Locked(record) | LockOutcome::AlreadyLocked(record) => record,
        }
    }

    pub fn into_record(self) -> ResultRecord {
        match self {
            LockOutcome::Locked(record) | LockOutcome::AlreadyLocked(record) => record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_wire_shape() {
        let record = ResultRecord {
            tests: vec![ResultSet {
                id: "s1".into(),
                tests: vec![TestResult {
                    id: "t1".into(),
                    score: 1,
                    max_score: 2,
                    correct: vec![0],
                    wrong: vec![],
                    skipped: vec![],
                }],
            }],
            validation_code: Some("AB-42".into()),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "tests": [{"id": "s1", "tests": [
                    {"id": "t1", "score": 1, "maxScore": 2, "correct": [0], "wrong": []}
                ]}],
                "validationCode": "AB-42"
            })
        );
        let back: ResultRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
        assert!(back.is_locked());
    }

    #[test]
    fn unlocked_record_omits_code() {
        let value = serde_json::to_value(ResultRecord::default()).unwrap();
        assert_eq!(value, json!({"tests": []}));
    }

    #[test]
    fn set_totals() {
        let set = ResultSet {
            id: "s".into(),
            tests: vec![
                TestResult::from_scored(
                    "a",
                    Scored {
                        score: 1,
                        max_score: 2,
                        ..Default::default()
                    },
                ),
                TestResult::from_scored(
                    "b",
                    Scored {
                        score: 3,
                        max_score: 3,
                        ..Default::default()
                    },
                ),
            ],
        };
        assert_eq!(set.score(), 4);
        assert_eq!(set.max_score(), 5);
    }
}
