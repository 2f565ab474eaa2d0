//! Result calculation: applies the scoring strategies across a journal.

use crate::error::CalculationError;
use crate::index::ConfigIndex;
use crate::journal::Journal;
use crate::model::CourseConfig;
use crate::results::{ResultSet, TestResult};
use crate::scoring::ScorerRegistry;

/// Score every evaluated test of `journal`.
///
/// Sets and tests keep the order of the journal structure. A test missing
/// from `config` or from the log aborts the whole calculation; a category
/// without a registered strategy is skipped with a warning.
pub fn calculate_results(
    config: &CourseConfig,
    journal: &Journal,
    registry: &ScorerRegistry,
) -> Result<Vec<ResultSet>, CalculationError> {
    let index = ConfigIndex::new(config);
    let mut results = Vec::with_capacity(journal.structure.sets.len());

    for set in &journal.structure.sets {
        let mut tests = Vec::new();

        for element in set.tests().filter(|t| t.evaluated) {
            let definition =
                index
                    .test(&element.id)
                    .ok_or_else(|| CalculationError::MissingTestConfig {
                        set: set.id.clone(),
                        test: element.id.clone(),
                    })?;

            let answer = journal.log.get(&set.id, &element.id).ok_or_else(|| {
                CalculationError::MissingLogEntry {
                    set: set.id.clone(),
                    test: element.id.clone(),
                }
            })?;

            let Some(strategy) = registry.get(definition.category) else {
                tracing::warn!(
                    test = %definition.id,
                    category = %definition.category,
                    "no scoring strategy registered, skipping"
                );
                continue;
            };

            let scored = strategy.score(Some(definition), answer)?;
            tracing::debug!(
                set = %set.id,
                test = %definition.id,
                scorer = strategy.name(),
                score = scored.score,
                max = scored.max_score,
                "scored test"
            );
            tests.push(TestResult::from_scored(definition.id.clone(), scored));
        }

        results.push(ResultSet {
            id: set.id.clone(),
            tests,
        });
    }

    Ok(results)
}

/// Holds a scorer registry for repeated calculations.
#[derive(Debug, Clone, Default)]
pub struct ResultCalculator {
    registry: ScorerRegistry,
}

impl ResultCalculator {
    pub fn new(registry: ScorerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ScorerRegistry {
        &self.registry
    }

    pub fn calculate(
        &self,
        config: &CourseConfig,
        journal: &Journal,
    ) -> Result<Vec<ResultSet>, CalculationError> {
        calculate_results(config, journal, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalLog;
    use crate::model::{Category, CorrectValue, SingleTest, TestOption, TestSet};
    use crate::structure::{JournalStructure, StructureElement, StructureSet};
    use serde_json::json;
    use std::sync::Arc;

    fn choice(id: &str, evaluated: bool) -> SingleTest {
        SingleTest {
            id: id.into(),
            category: Category::Checkbox,
            task: format!("task {id}"),
            description: None,
            evaluated,
            options: vec![
                TestOption {
                    text: "yes".into(),
                    correct: Some(CorrectValue::Flag(true)),
                    index: None,
                },
                TestOption {
                    text: "no".into(),
                    correct: None,
                    index: None,
                },
            ],
            seconds: None,
            columns: vec![],
        }
    }

    fn config(tests: Vec<SingleTest>) -> CourseConfig {
        CourseConfig {
            title: "Course".into(),
            icon: None,
            validation_schema_template: "AA".into(),
            sets: vec![TestSet {
                id: "s1".into(),
                elements: tests.iter().map(|t| t.id.clone()).collect(),
                evaluation: Default::default(),
            }],
            tests,
            testgroups: vec![],
            infopages: vec![],
        }
    }

    fn journal(sets: Vec<(&str, Vec<SingleTest>)>, log: JournalLog) -> Journal {
        Journal {
            structure: JournalStructure {
                sets: sets
                    .into_iter()
                    .map(|(id, tests)| StructureSet {
                        id: id.into(),
                        elements: tests.into_iter().map(StructureElement::Test).collect(),
                        evaluation: Default::default(),
                    })
                    .collect(),
            },
            log,
        }
    }

    #[test]
    fn scores_in_structure_order() {
        let cfg = config(vec![choice("t1", true), choice("t2", true)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true, false]).into());
        log.record("s1", "t2", json!([true, true]).into());
        let j = journal(vec![("s1", vec![choice("t2", true), choice("t1", true)])], log);

        let results = calculate_results(&cfg, &j, &ScorerRegistry::standard()).unwrap();
        assert_eq!(results.len(), 1);
        let ids: Vec<_> = results[0].tests.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t2", "t1"]);
        assert_eq!(results[0].tests[0].wrong, vec![1]);
        assert_eq!(results[0].tests[1].correct, vec![0]);
        assert_eq!(results[0].score(), 2);
    }

    #[test]
    fn unevaluated_tests_are_left_out() {
        let cfg = config(vec![choice("t1", true), choice("t2", false)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true), choice("t2", false)])], log);

        let results = calculate_results(&cfg, &j, &ScorerRegistry::standard()).unwrap();
        assert_eq!(results[0].tests.len(), 1);
        assert_eq!(results[0].tests[0].id, "t1");
    }

    #[test]
    fn unknown_test_aborts_the_whole_calculation() {
        let cfg = config(vec![choice("t1", true)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true]).into());
        log.record("s1", "ghost", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true), choice("ghost", true)])], log);

        let err = calculate_results(&cfg, &j, &ScorerRegistry::standard()).unwrap_err();
        assert_eq!(
            err,
            CalculationError::MissingTestConfig {
                set: "s1".into(),
                test: "ghost".into()
            }
        );
    }

    #[test]
    fn missing_log_entry_aborts() {
        let cfg = config(vec![choice("t1", true), choice("t2", true)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true), choice("t2", true)])], log);

        let err = calculate_results(&cfg, &j, &ScorerRegistry::standard()).unwrap_err();
        assert!(matches!(err, CalculationError::MissingLogEntry { ref test, .. } if test == "t2"));
    }

    #[test]
    fn log_lookup_is_per_set() {
        let cfg = config(vec![choice("t1", true)]);
        let mut log = JournalLog::new();
        log.record("other", "t1", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true)])], log);

        assert!(calculate_results(&cfg, &j, &ScorerRegistry::standard()).is_err());
    }

    #[test]
    fn unregistered_category_is_skipped() {
        let cfg = config(vec![choice("t1", true)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true)])], log);

        let results = calculate_results(&cfg, &j, &ScorerRegistry::empty()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].tests.is_empty());
    }

    #[test]
    fn every_set_yields_a_result_set() {
        let cfg = config(vec![choice("t1", true)]);
        let j = journal(vec![("intro", vec![]), ("empty", vec![])], JournalLog::new());

        let results = calculate_results(&cfg, &j, &ScorerRegistry::standard()).unwrap();
        let ids: Vec<_> = results.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["intro", "empty"]);
    }

    #[test]
    fn calculator_uses_its_registry() {
        let mut registry = ScorerRegistry::empty();
        registry.register(Category::Checkbox, Arc::new(crate::scoring::ChoiceScorer));
        let calculator = ResultCalculator::new(registry);

        let cfg = config(vec![choice("t1", true)]);
        let mut log = JournalLog::new();
        log.record("s1", "t1", json!([true]).into());
        let j = journal(vec![("s1", vec![choice("t1", true)])], log);

        let results = calculator.calculate(&cfg, &j).unwrap();
        assert_eq!(results[0].tests[0].score, 1);
        assert!(calculator.registry().get(Category::Speed).is_none());
    }
}
