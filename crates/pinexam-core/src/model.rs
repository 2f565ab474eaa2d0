//! Course configuration types.
//!
//! A course configuration is authored externally as JSON and is read-only once
//! loaded. Use [`crate::validator::parse_course_config`] to obtain one; it
//! runs the structural and semantic checks before deserializing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A complete course configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseConfig {
    /// Course title shown to the user.
    pub title: String,
    /// Optional icon reference for the course picker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Template used to generate the validation code on lock.
    pub validation_schema_template: String,
    /// All tests declared by the course.
    #[serde(default)]
    pub tests: Vec<SingleTest>,
    /// Groups of tests, optionally reduced to a random subset.
    #[serde(default)]
    pub testgroups: Vec<TestGroup>,
    /// Ordered sets the user works through.
    #[serde(default)]
    pub sets: Vec<TestSet>,
    /// Informational pages shown before the entities they belong to.
    #[serde(default)]
    pub infopages: Vec<InfoPage>,
}

/// The fixed test-behaviour kind. Determines UI shape and scoring algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Checkbox,
    RadioButtons,
    MultipleChoice,
    MultipleOptions,
    Speed,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Checkbox,
        Category::RadioButtons,
        Category::MultipleChoice,
        Category::MultipleOptions,
        Category::Speed,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Checkbox => "CHECKBOX",
            Category::RadioButtons => "RADIO_BUTTONS",
            Category::MultipleChoice => "MULTIPLE_CHOICE",
            Category::MultipleOptions => "MULTIPLE_OPTIONS",
            Category::Speed => "SPEED",
        }
    }

    /// Categories whose options must all carry a `correct` value.
    pub fn requires_correct_on_every_option(&self) -> bool {
        matches!(self, Category::MultipleOptions | Category::Speed)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// A single test as declared in the course configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleTest {
    pub id: String,
    pub category: Category,
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the test contributes to the result.
    #[serde(default = "default_true")]
    pub evaluated: bool,
    #[serde(default)]
    pub options: Vec<TestOption>,
    /// Time limit for SPEED tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    /// Column headers for MULTIPLE_OPTIONS grids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// One option of a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOption {
    pub text: String,
    /// Expected value. Its meaning depends on the category: a flag for the
    /// choice categories, a column for grids, a substring for SPEED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<CorrectValue>,
    /// Which occurrence of `correct` inside `text` counts (SPEED only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<OccurrenceIndex>,
}

impl TestOption {
    /// Whether this option counts towards the maximum score.
    pub fn carries_correct(&self) -> bool {
        match &self.correct {
            Some(value) => value.is_truthy(),
            None => false,
        }
    }
}

/// The category-specific expected value of an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl CorrectValue {
    /// `false` never marks an option as carrying a correct value.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, CorrectValue::Flag(false))
    }

    /// Textual form used when comparing against grid answers.
    pub fn as_text(&self) -> String {
        match self {
            CorrectValue::Flag(b) => b.to_string(),
            CorrectValue::Number(n) => n.to_string(),
            CorrectValue::Text(s) => s.clone(),
        }
    }
}

/// SPEED occurrence index; authored either as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OccurrenceIndex {
    Number(u64),
    Text(String),
}

impl OccurrenceIndex {
    pub fn resolve(&self) -> Option<usize> {
        match self {
            OccurrenceIndex::Number(n) => usize::try_from(*n).ok(),
            OccurrenceIndex::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A group of tests, optionally reduced to `select` randomly drawn members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestGroup {
    pub id: String,
    pub tests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<usize>,
}

/// An ordered set of tests and groups with its evaluation texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSet {
    pub id: String,
    pub elements: Vec<String>,
    #[serde(default)]
    pub evaluation: EvaluationTexts,
}

/// Score-independent message plus ordered score thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTexts {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thresholds: Vec<ScoreThreshold>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreThreshold {
    pub score: u32,
    pub text: String,
}

/// A page of information shown before each entity listed in `belongs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoPage {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub belongs: Vec<String>,
}

/// Identifies one course document: course name and language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseRef {
    pub name: String,
    pub language: String,
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.language)
    }
}
