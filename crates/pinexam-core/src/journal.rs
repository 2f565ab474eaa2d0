//! Journals: what a user must complete and what they answered.
//!
//! The log is kept as a nested map in memory. On the wire it is a list of
//! `{ set, entries: [{ key, val }] }` records, which round-trips losslessly
//! and rejects duplicate keys within a set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::CourseRef;
use crate::structure::{JournalStructure, MinimalStructure};

/// Numeric token identifying one anonymous user across course selection,
/// journal and result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pin(pub u64);

impl Pin {
    /// Draw a fresh eight-digit pin.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Pin(rng.gen_range(10_000_000..100_000_000))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Pin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid pin: '{s}'"));
        }
        s.parse::<u64>()
            .map(Pin)
            .map_err(|_| format!("invalid pin: '{s}'"))
    }
}

/// A recorded answer. Its shape depends on the test category: an array of
/// booleans, an array of column choices, or an array of `[start, end]` spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answer(pub Value);

impl From<Value> for Answer {
    fn from(value: Value) -> Self {
        Answer(value)
    }
}

/// Answers keyed by set id, then by test id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<LogSetWire>", try_from = "Vec<LogSetWire>")]
pub struct JournalLog {
    sets: BTreeMap<String, BTreeMap<String, Answer>>,
}

impl JournalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer for `test` within `set`.
    pub fn record(&mut self, set: &str, test: &str, answer: Answer) {
        self.sets
            .entry(set.to_string())
            .or_default()
            .insert(test.to_string(), answer);
    }

    pub fn get(&self, set: &str, test: &str) -> Option<&Answer> {
        self.sets.get(set)?.get(test)
    }

    /// Number of recorded answers across all sets.
    pub fn len(&self) -> usize {
        self.sets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wire record for one set of the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSetWire {
    pub set: String,
    #[serde(default)]
    pub entries: Vec<LogEntryWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryWire {
    pub key: String,
    pub val: Answer,
}

impl From<JournalLog> for Vec<LogSetWire> {
    fn from(log: JournalLog) -> Self {
        log.sets
            .into_iter()
            .map(|(set, entries)| LogSetWire {
                set,
                entries: entries
                    .into_iter()
                    .map(|(key, val)| LogEntryWire { key, val })
                    .collect(),
            })
            .collect()
    }
}

impl TryFrom<Vec<LogSetWire>> for JournalLog {
    type Error = String;

    fn try_from(wire: Vec<LogSetWire>) -> Result<Self, Self::Error> {
        let mut sets: BTreeMap<String, BTreeMap<String, Answer>> = BTreeMap::new();
        for record in wire {
            let entries = sets.entry(record.set.clone()).or_default();
            for entry in record.entries {
                if entries.contains_key(&entry.key) {
                    return Err(format!(
                        "duplicate log key {} in set {}",
                        entry.key, record.set
                    ));
                }
                entries.insert(entry.key, entry.val);
            }
        }
        Ok(JournalLog { sets })
    }
}

/// A user's full state: the resolved structure plus the answers so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub structure: JournalStructure,
    #[serde(default)]
    pub log: JournalLog,
}

impl Journal {
    /// A fresh journal with an empty log.
    pub fn new(structure: JournalStructure) -> Self {
        Self {
            structure,
            log: JournalLog::new(),
        }
    }
}

/// The persisted form of a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRecord {
    pub course: CourseRef,
    pub structure: MinimalStructure,
    #[serde(default)]
    pub log: JournalLog,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn pin_parse_and_display() {
        assert_eq!("12345678".parse::<Pin>().unwrap(), Pin(12_345_678));
        assert_eq!(Pin(42).to_string(), "42");
        assert!("12a".parse::<Pin>().is_err());
        assert!("".parse::<Pin>().is_err());
        assert!("-5".parse::<Pin>().is_err());
    }

    #[test]
    fn generated_pins_have_eight_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(Pin::generate(&mut rng).to_string().len(), 8);
        }
    }

    #[test]
    fn log_wire_shape_is_list_of_pairs() {
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true, false]).into());
        log.record("s1", "t2", json!([[5, 6]]).into());
        log.record("s2", "t1", json!(["left"]).into());

        let wire = serde_json::to_value(&log).unwrap();
        assert_eq!(
            wire,
            json!([
                {"set": "s1", "entries": [
                    {"key": "t1", "val": [true, false]},
                    {"key": "t2", "val": [[5, 6]]}
                ]},
                {"set": "s2", "entries": [{"key": "t1", "val": ["left"]}]}
            ])
        );

        let back: JournalLog = serde_json::from_value(wire).unwrap();
        assert_eq!(back, log);
        assert_eq!(back.len(), 3);
        assert_eq!(back.get("s2", "t1"), Some(&Answer(json!(["left"]))));
        assert!(back.get("s2", "t2").is_none());
    }

    #[test]
    fn duplicate_keys_within_a_set_are_rejected() {
        let wire = json!([
            {"set": "s1", "entries": [{"key": "t1", "val": [true]}]},
            {"set": "s1", "entries": [{"key": "t1", "val": [false]}]}
        ]);
        let err = serde_json::from_value::<JournalLog>(wire).unwrap_err();
        assert!(err.to_string().contains("duplicate log key t1"));
    }

    #[test]
    fn same_key_in_different_sets_is_allowed() {
        let wire = json!([
            {"set": "s1", "entries": [{"key": "t1", "val": [true]}]},
            {"set": "s2", "entries": [{"key": "t1", "val": [false]}]}
        ]);
        let log: JournalLog = serde_json::from_value(wire).unwrap();
        assert_eq!(log.len(), 2);
    }
}
