//! Course document validation and loading.
//!
//! Validation runs in two passes. The structural pass walks the untyped JSON
//! document against the closed course schema and collects every violation.
//! The semantic pass runs on the typed document and stops at the first
//! uniqueness or referential-integrity problem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::error::{SemanticViolation, ValidationError, Violation};
use crate::model::{Category, CourseConfig};

/// Validate a raw course document. `Ok(())` means the document is accepted
/// as a whole.
pub fn validate_config(doc: &Value) -> Result<(), ValidationError> {
    parse_course_config(doc).map(|_| ())
}

/// Validate a raw course document and deserialize it.
pub fn parse_course_config(doc: &Value) -> Result<CourseConfig, ValidationError> {
    let violations = structural_violations(doc);
    if !violations.is_empty() {
        return Err(ValidationError::Structural(violations));
    }

    let config: CourseConfig = serde_json::from_value(doc.clone())
        .map_err(|e| ValidationError::Structural(vec![Violation::new("", e.to_string())]))?;

    check_semantics(&config).map_err(ValidationError::Semantic)?;
    Ok(config)
}

/// Parse a JSON string into a validated `CourseConfig`.
pub fn parse_course_config_str(content: &str, source_path: &Path) -> Result<CourseConfig> {
    let doc: Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    let config = parse_course_config(&doc)
        .with_context(|| format!("invalid course document: {}", source_path.display()))?;
    Ok(config)
}

/// Read and validate a single course file.
pub fn load_course_file(path: &Path) -> Result<CourseConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file: {}", path.display()))?;
    parse_course_config_str(&content, path)
}

/// Recursively collect all `.json` files below `dir`, sorted by path.
pub fn find_course_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(find_course_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Structural pass
// ---------------------------------------------------------------------------

/// Collect every structural violation of `doc` against the course schema.
pub fn structural_violations(doc: &Value) -> Vec<Violation> {
    let mut walker = Walker::default();
    walker.course(doc);
    walker.violations
}

#[derive(Default)]
struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.report(path, format!("expected an object, found {}", kind(other)));
                None
            }
        }
    }

    /// Report missing required keys and keys outside the closed schema.
    fn fields(
        &mut self,
        map: &Map<String, Value>,
        path: &str,
        required: &[&str],
        optional: &[&str],
    ) {
        for key in required {
            if !map.contains_key(*key) {
                self.report(path, format!("missing required field `{key}`"));
            }
        }
        for key in map.keys() {
            if !required.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
                self.report(path, format!("unknown field `{key}`"));
            }
        }
    }

    fn string(&mut self, map: &Map<String, Value>, key: &str, path: &str) {
        if let Some(value) = map.get(key) {
            if !value.is_string() {
                self.report(
                    &format!("{path}/{key}"),
                    format!("expected a string, found {}", kind(value)),
                );
            }
        }
    }

    fn id(&mut self, map: &Map<String, Value>, path: &str) {
        match map.get("id") {
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.report(&format!("{path}/id"), "id must not be empty");
            }
            Some(_) => self.string(map, "id", path),
            None => {}
        }
    }

    fn boolean(&mut self, map: &Map<String, Value>, key: &str, path: &str) {
        if let Some(value) = map.get(key) {
            if !value.is_boolean() {
                self.report(
                    &format!("{path}/{key}"),
                    format!("expected a boolean, found {}", kind(value)),
                );
            }
        }
    }

    fn unsigned(&mut self, map: &Map<String, Value>, key: &str, path: &str, min: u64) {
        if let Some(value) = map.get(key) {
            match value.as_u64() {
                Some(n) if n >= min => {}
                _ => self.report(
                    &format!("{path}/{key}"),
                    format!("expected an integer >= {min}, found {value}"),
                ),
            }
        }
    }

    fn array<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        match map.get(key)? {
            Value::Array(items) => Some(items),
            other => {
                self.report(
                    &format!("{path}/{key}"),
                    format!("expected an array, found {}", kind(other)),
                );
                None
            }
        }
    }

    fn string_array(&mut self, map: &Map<String, Value>, key: &str, path: &str) {
        if let Some(items) = self.array(map, key, path) {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    self.report(
                        &format!("{path}/{key}/{i}"),
                        format!("expected a string, found {}", kind(item)),
                    );
                }
            }
        }
    }

    fn each(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
        mut visit: impl FnMut(&mut Self, &Value, &str),
    ) {
        if let Some(items) = self.array(map, key, path) {
            for (i, item) in items.iter().enumerate() {
                visit(self, item, &format!("{path}/{key}/{i}"));
            }
        }
    }

    fn course(&mut self, doc: &Value) {
        let Some(map) = self.object(doc, "") else {
            return;
        };
        self.fields(
            map,
            "",
            &["title", "validationSchemaTemplate", "tests", "sets"],
            &["icon", "testgroups", "infopages"],
        );
        self.string(map, "title", "");
        self.string(map, "icon", "");
        self.string(map, "validationSchemaTemplate", "");
        self.each(map, "tests", "", Self::test);
        self.each(map, "testgroups", "", Self::group);
        self.each(map, "sets", "", Self::set);
        self.each(map, "infopages", "", Self::infopage);
    }

    fn test(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path) else {
            return;
        };
        self.fields(
            map,
            path,
            &["id", "category", "task", "options"],
            &["description", "evaluated", "seconds", "columns"],
        );
        self.id(map, path);
        self.string(map, "task", path);
        self.string(map, "description", path);
        self.boolean(map, "evaluated", path);
        self.unsigned(map, "seconds", path, 0);
        self.string_array(map, "columns", path);
        if let Some(category) = map.get("category") {
            match category.as_str().map(str::parse::<Category>) {
                Some(Ok(_)) => {}
                Some(Err(e)) => self.report(&format!("{path}/category"), e),
                None => self.report(
                    &format!("{path}/category"),
                    format!("expected a category name, found {}", kind(category)),
                ),
            }
        }
        self.each(map, "options", path, Self::option);
    }

    fn option(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path) else {
            return;
        };
        self.fields(map, path, &["text"], &["correct", "index"]);
        self.string(map, "text", path);
        if let Some(correct) = map.get("correct") {
            let ok = correct.is_boolean()
                || correct.is_string()
                || correct.is_i64()
                || correct.is_null();
            if !ok {
                self.report(
                    &format!("{path}/correct"),
                    format!("expected a boolean, string or integer, found {}", kind(correct)),
                );
            }
        }
        if let Some(index) = map.get("index") {
            if !(index.is_u64() || index.is_string()) {
                self.report(
                    &format!("{path}/index"),
                    format!("expected a non-negative integer or string, found {index}"),
                );
            }
        }
    }

    fn group(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path) else {
            return;
        };
        self.fields(map, path, &["id", "tests"], &["select"]);
        self.id(map, path);
        self.string_array(map, "tests", path);
        self.unsigned(map, "select", path, 1);
    }

    fn set(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path) else {
            return;
        };
        self.fields(map, path, &["id", "elements"], &["evaluation"]);
        self.id(map, path);
        self.string_array(map, "elements", path);

        let Some(evaluation) = map.get("evaluation") else {
            return;
        };
        let eval_path = format!("{path}/evaluation");
        let Some(eval) = self.object(evaluation, &eval_path) else {
            return;
        };
        self.fields(eval, &eval_path, &[], &["text", "thresholds"]);
        self.string(eval, "text", &eval_path);
        self.each(eval, "thresholds", &eval_path, |w, item, item_path| {
            let Some(threshold) = w.object(item, item_path) else {
                return;
            };
            w.fields(threshold, item_path, &["score", "text"], &[]);
            w.unsigned(threshold, "score", item_path, 0);
            w.string(threshold, "text", item_path);
        });
    }

    fn infopage(&mut self, value: &Value, path: &str) {
        let Some(map) = self.object(value, path) else {
            return;
        };
        self.fields(map, path, &["id", "text", "belongs"], &[]);
        self.id(map, path);
        self.string(map, "text", path);
        self.string_array(map, "belongs", path);
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Semantic pass
// ---------------------------------------------------------------------------

/// Check uniqueness and referential integrity, stopping at the first problem.
pub fn check_semantics(config: &CourseConfig) -> Result<(), SemanticViolation> {
    let mut test_ids = HashSet::new();
    for test in &config.tests {
        if !test_ids.insert(test.id.as_str()) {
            return Err(SemanticViolation::DuplicateTestId(test.id.clone()));
        }
    }

    for test in &config.tests {
        if !test.category.requires_correct_on_every_option() {
            continue;
        }
        if let Some(option) = test.options.iter().position(|o| !o.carries_correct()) {
            return Err(SemanticViolation::MissingCorrectValue {
                test: test.id.clone(),
                category: test.category.to_string(),
                option,
            });
        }
    }

    let mut group_ids = HashSet::new();
    for group in &config.testgroups {
        if !group_ids.insert(group.id.as_str()) {
            return Err(SemanticViolation::DuplicateGroupId(group.id.clone()));
        }
        if let Some(test) = group.tests.iter().find(|t| !test_ids.contains(t.as_str())) {
            return Err(SemanticViolation::UnknownGroupTest {
                group: group.id.clone(),
                test: test.clone(),
            });
        }
        if let Some(select) = group.select {
            if select > group.tests.len() {
                return Err(SemanticViolation::SelectExceedsGroup {
                    group: group.id.clone(),
                    select,
                    available: group.tests.len(),
                });
            }
        }
    }

    let mut set_ids = HashSet::new();
    for set in &config.sets {
        if !set_ids.insert(set.id.as_str()) {
            return Err(SemanticViolation::DuplicateSetId(set.id.clone()));
        }
        let dangling = set
            .elements
            .iter()
            .find(|e| !test_ids.contains(e.as_str()) && !group_ids.contains(e.as_str()));
        if let Some(element) = dangling {
            return Err(SemanticViolation::UnknownSetElement {
                set: set.id.clone(),
                element: element.clone(),
            });
        }
    }

    let mut page_ids = HashSet::new();
    for page in &config.infopages {
        if !page_ids.insert(page.id.as_str()) {
            return Err(SemanticViolation::DuplicateInfoPageId(page.id.clone()));
        }
        let dangling = page.belongs.iter().find(|owner| {
            let owner = owner.as_str();
            !test_ids.contains(owner) && !group_ids.contains(owner) && !set_ids.contains(owner)
        });
        if let Some(owner) = dangling {
            return Err(SemanticViolation::UnknownInfoPageOwner {
                page: page.id.clone(),
                owner: owner.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_doc() -> Value {
        json!({
            "title": "Road Safety",
            "icon": "car.svg",
            "validationSchemaTemplate": "AA-[0-9][0-9]%2",
            "tests": [
                {"id": "t1", "category": "CHECKBOX", "task": "Pick the signs",
                 "options": [{"text": "stop", "correct": true}, {"text": "go", "correct": false}]},
                {"id": "t2", "category": "RADIO_BUTTONS", "task": "One answer",
                 "options": [{"text": "yes", "correct": true}, {"text": "no"}]},
                {"id": "t3", "category": "MULTIPLE_OPTIONS", "task": "Grid",
                 "columns": ["left", "right"],
                 "options": [{"text": "a", "correct": "left"}, {"text": "b", "correct": "right"}]},
                {"id": "t4", "category": "SPEED", "task": "Find it", "seconds": 30,
                 "options": [{"text": "ab:cd:ef", "correct": ":", "index": 1}]},
                {"id": "t5", "category": "MULTIPLE_CHOICE", "task": "Warm up", "evaluated": false,
                 "options": [{"text": "x", "correct": true}]}
            ],
            "testgroups": [
                {"id": "g1", "tests": ["t1", "t2", "t3"], "select": 2}
            ],
            "sets": [
                {"id": "s1", "elements": ["t5", "g1", "t4"],
                 "evaluation": {"text": "Thanks", "thresholds": [{"score": 2, "text": "Good"}]}}
            ],
            "infopages": [
                {"id": "i1", "text": "Welcome", "belongs": ["s1"]},
                {"id": "i2", "text": "Speed round", "belongs": ["t4", "g1"]}
            ]
        })
    }

    #[test]
    fn accepts_valid_document() {
        let config = parse_course_config(&valid_doc()).unwrap();
        assert_eq!(config.title, "Road Safety");
        assert_eq!(config.tests.len(), 5);
        assert!(!config.tests[4].evaluated);
        assert!(validate_config(&valid_doc()).is_ok());
    }

    #[test]
    fn structural_pass_collects_all_violations() {
        let doc = json!({
            "title": 5,
            "tests": [
                {"id": "t1", "category": "SLIDER", "task": "x", "options": [{"text": 1}]},
                {"id": "", "task": "y", "options": [], "colour": "red"}
            ],
            "sets": [{"id": "s1", "elements": [3]}],
            "extra": true
        });
        let Err(ValidationError::Structural(violations)) = validate_config(&doc) else {
            panic!("expected structural failure");
        };
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/title"));
        assert!(paths.contains(&"/tests/0/category"));
        assert!(paths.contains(&"/tests/0/options/0/text"));
        assert!(paths.contains(&"/tests/1/id"));
        assert!(paths.contains(&"/sets/0/elements/0"));
        assert!(violations
            .iter()
            .any(|v| v.path.is_empty() && v.message.contains("validationSchemaTemplate")));
        assert!(violations.iter().any(|v| v.message.contains("`extra`")));
        assert!(violations.iter().any(|v| v.message.contains("`colour`")));
        assert!(violations.len() >= 8);
    }

    #[test]
    fn rejects_non_object_root() {
        let Err(ValidationError::Structural(violations)) = validate_config(&json!([1, 2])) else {
            panic!("expected structural failure");
        };
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn rejects_duplicate_ids_in_each_class() {
        let mut doc = valid_doc();
        doc["tests"][1]["id"] = json!("t1");
        assert_eq!(
            validate_config(&doc),
            Err(ValidationError::Semantic(SemanticViolation::DuplicateTestId(
                "t1".into()
            )))
        );

        let mut doc = valid_doc();
        doc["testgroups"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "g1", "tests": ["t1"]}));
        assert!(matches!(
            validate_config(&doc),
            Err(ValidationError::Semantic(SemanticViolation::DuplicateGroupId(_)))
        ));

        let mut doc = valid_doc();
        doc["sets"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "s1", "elements": []}));
        assert!(matches!(
            validate_config(&doc),
            Err(ValidationError::Semantic(SemanticViolation::DuplicateSetId(_)))
        ));

        let mut doc = valid_doc();
        doc["infopages"][1]["id"] = json!("i1");
        assert!(matches!(
            validate_config(&doc),
            Err(ValidationError::Semantic(SemanticViolation::DuplicateInfoPageId(_)))
        ));
    }

    #[test]
    fn grid_and_speed_options_need_correct_values() {
        let mut doc = valid_doc();
        doc["tests"][3]["options"][0]
            .as_object_mut()
            .unwrap()
            .remove("correct");
        assert_eq!(
            validate_config(&doc),
            Err(ValidationError::Semantic(
                SemanticViolation::MissingCorrectValue {
                    test: "t4".into(),
                    category: "SPEED".into(),
                    option: 0,
                }
            ))
        );
    }

    #[test]
    fn grid_options_marked_false_count_as_missing() {
        let mut doc = valid_doc();
        doc["tests"][2]["options"][1]["correct"] = json!(false);
        assert_eq!(
            validate_config(&doc),
            Err(ValidationError::Semantic(
                SemanticViolation::MissingCorrectValue {
                    test: "t3".into(),
                    category: "MULTIPLE_OPTIONS".into(),
                    option: 1,
                }
            ))
        );
    }

    #[test]
    fn dangling_references_are_referential_errors() {
        let mut doc = valid_doc();
        doc["testgroups"][0]["tests"][0] = json!("t99");
        let err = validate_config(&doc).unwrap_err();
        assert!(err.is_referential());

        let mut doc = valid_doc();
        doc["sets"][0]["elements"][0] = json!("ghost");
        let err = validate_config(&doc).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Semantic(SemanticViolation::UnknownSetElement { .. })
        ));

        let mut doc = valid_doc();
        doc["infopages"][0]["belongs"][0] = json!("nowhere");
        let err = validate_config(&doc).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Semantic(SemanticViolation::UnknownInfoPageOwner { .. })
        ));
    }

    #[test]
    fn semantic_pass_reports_first_violation_in_order() {
        let mut doc = valid_doc();
        doc["tests"][1]["id"] = json!("t1");
        doc["sets"][0]["elements"][0] = json!("ghost");
        assert!(matches!(
            validate_config(&doc),
            Err(ValidationError::Semantic(SemanticViolation::DuplicateTestId(_)))
        ));
    }

    #[test]
    fn select_larger_than_group_is_rejected() {
        let mut doc = valid_doc();
        doc["testgroups"][0]["select"] = json!(4);
        assert!(matches!(
            validate_config(&doc),
            Err(ValidationError::Semantic(
                SemanticViolation::SelectExceedsGroup {
                    select: 4,
                    available: 3,
                    ..
                }
            ))
        ));
    }

    #[test]
    fn load_directory_of_course_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("road").join("en.json");
        std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
        std::fs::write(&nested, valid_doc().to_string()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = find_course_files(dir.path()).unwrap();
        assert_eq!(files, vec![nested.clone()]);
        let config = load_course_file(&nested).unwrap();
        assert_eq!(config.sets[0].id, "s1");
    }

    #[test]
    fn malformed_json_fails_to_load() {
        let result = parse_course_config_str("{ not json", Path::new("bad.json"));
        assert!(result.is_err());
    }
}
