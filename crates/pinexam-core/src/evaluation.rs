//! Per-set evaluation summaries shown at the end of a course.

use serde::{Deserialize, Serialize};

use crate::model::EvaluationTexts;
use crate::results::ResultSet;
use crate::structure::JournalStructure;

/// Score totals and evaluation texts for one set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
    pub id: String,
    pub score: u32,
    pub max_score: u32,
    /// Score as a percentage of the maximum; 0 when nothing could be scored.
    pub percent: f64,
    /// Score-independent evaluation text.
    pub text: String,
    /// Text of the threshold reached, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_text: Option<String>,
}

/// Summarize `results` against the evaluation texts of `structure`.
///
/// Sets appear in structure order. A set without results scores zero.
pub fn summarize(structure: &JournalStructure, results: &[ResultSet]) -> Vec<SetSummary> {
    structure
        .sets
        .iter()
        .map(|set| {
            let (score, max_score) = results
                .iter()
                .find(|r| r.id == set.id)
                .map_or((0, 0), |r| (r.score(), r.max_score()));
            SetSummary {
                id: set.id.clone(),
                score,
                max_score,
                percent: percent(score, max_score),
                text: set.evaluation.text.clone(),
                threshold_text: threshold_text(&set.evaluation, score).map(str::to_string),
            }
        })
        .collect()
}

/// The last threshold, in declared order, whose score is reached.
pub fn threshold_text(evaluation: &EvaluationTexts, score: u32) -> Option<&str> {
    evaluation
        .thresholds
        .iter()
        .filter(|t| t.score <= score)
        .last()
        .map(|t| t.text.as_str())
}

fn percent(score: u32, max_score: u32) -> f64 {
    if max_score == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(max_score) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoreThreshold;
    use crate::results::TestResult;
    use crate::structure::StructureSet;

    fn evaluation() -> EvaluationTexts {
        EvaluationTexts {
            text: "Thanks for taking part.".into(),
            thresholds: vec![
                ScoreThreshold {
                    score: 0,
                    text: "Keep practising.".into(),
                },
                ScoreThreshold {
                    score: 3,
                    text: "Good.".into(),
                },
                ScoreThreshold {
                    score: 5,
                    text: "Excellent!".into(),
                },
            ],
        }
    }

    fn result(id: &str, score: u32, max_score: u32) -> TestResult {
        TestResult {
            id: id.into(),
            score,
            max_score,
            correct: vec![],
            wrong: vec![],
            skipped: vec![],
        }
    }

    #[test]
    fn picks_highest_reached_threshold() {
        assert_eq!(threshold_text(&evaluation(), 0), Some("Keep practising."));
        assert_eq!(threshold_text(&evaluation(), 4), Some("Good."));
        assert_eq!(threshold_text(&evaluation(), 9), Some("Excellent!"));
        assert_eq!(threshold_text(&EvaluationTexts::default(), 9), None);
    }

    #[test]
    fn summaries_follow_structure_order() {
        let structure = JournalStructure {
            sets: vec![
                StructureSet {
                    id: "a".into(),
                    elements: vec![],
                    evaluation: evaluation(),
                },
                StructureSet {
                    id: "b".into(),
                    elements: vec![],
                    evaluation: Default::default(),
                },
            ],
        };
        let results = vec![
            ResultSet {
                id: "b".into(),
                tests: vec![],
            },
            ResultSet {
                id: "a".into(),
                tests: vec![result("t1", 2, 2), result("t2", 1, 2)],
            },
        ];

        let summaries = summarize(&structure, &results);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "a");
        assert_eq!(summaries[0].score, 3);
        assert_eq!(summaries[0].max_score, 4);
        assert!((summaries[0].percent - 75.0).abs() < f64::EPSILON);
        assert_eq!(summaries[0].threshold_text.as_deref(), Some("Good."));
        assert_eq!(summaries[1].percent, 0.0);
        assert_eq!(summaries[1].threshold_text, None);
    }
}
