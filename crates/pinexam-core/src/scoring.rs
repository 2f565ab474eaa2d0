//! Category-specific scoring strategies.
//!
//! Every strategy implements [`ScoringStrategy`]; the [`ScorerRegistry`] maps
//! each [`Category`] to its strategy. A malformed element of a recorded answer
//! is skipped and reported (in [`Scored::skipped`] and the log) without
//! affecting the other options of the test.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ScoringError;
use crate::journal::Answer;
use crate::model::{Category, CorrectValue, SingleTest, TestOption};

/// Outcome of scoring one test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scored {
    pub score: u32,
    pub max_score: u32,
    /// Option indices answered correctly.
    pub correct: Vec<usize>,
    /// Option indices answered wrongly.
    pub wrong: Vec<usize>,
    /// Option indices whose answer element could not be interpreted.
    pub skipped: Vec<usize>,
}

impl Scored {
    fn new(max_score: u32) -> Self {
        Self {
            max_score,
            ..Default::default()
        }
    }

    fn hit(&mut self, index: usize) {
        self.score += 1;
        self.correct.push(index);
    }

    fn miss(&mut self, index: usize) {
        self.wrong.push(index);
    }

    fn skip(&mut self, test: &SingleTest, index: usize, reason: &str) {
        tracing::warn!(test = %test.id, option = index, "skipping malformed answer: {reason}");
        self.skipped.push(index);
    }
}

/// Scores a recorded answer against a test definition.
pub trait ScoringStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Score `answer` against `test`. Fails with
    /// [`ScoringError::ConfigMissing`] when `test` is absent.
    fn score(&self, test: Option<&SingleTest>, answer: &Answer) -> Result<Scored, ScoringError>;

    /// The number of options carrying a correct value.
    fn max_score(&self, test: &SingleTest) -> u32 {
        test.options.iter().filter(|o| o.carries_correct()).count() as u32
    }
}

/// Split an answer into per-option elements. A non-array answer marks every
/// option as skipped.
fn answer_elements<'a>(
    test: &SingleTest,
    answer: &'a Answer,
    scored: &mut Scored,
) -> Option<&'a [Value]> {
    match &answer.0 {
        Value::Array(items) => Some(items),
        _ => {
            for index in 0..test.options.len() {
                scored.skip(test, index, "answer is not an array");
            }
            None
        }
    }
}

// ---------------------------------------------------------------------------
// CHECKBOX / RADIO_BUTTONS / MULTIPLE_CHOICE
// ---------------------------------------------------------------------------

/// Scores selection answers: one boolean per option.
///
/// A selected option that is correct scores a point; a selected option that
/// is not correct is recorded as wrong. Unselected options contribute nothing.
#[derive(Debug, Default)]
pub struct ChoiceScorer;

impl ScoringStrategy for ChoiceScorer {
    fn name(&self) -> &str {
        "choice"
    }

    fn score(&self, test: Option<&SingleTest>, answer: &Answer) -> Result<Scored, ScoringError> {
        let test = test.ok_or(ScoringError::ConfigMissing)?;
        let mut scored = Scored::new(self.max_score(test));
        let Some(elements) = answer_elements(test, answer, &mut scored) else {
            return Ok(scored);
        };

        for (index, option) in test.options.iter().enumerate() {
            let selected = match elements.get(index) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    scored.skip(test, index, &format!("expected a boolean, found {other}"));
                    continue;
                }
            };
            match (selected, option.carries_correct()) {
                (true, true) => scored.hit(index),
                (true, false) => scored.miss(index),
                (false, _) => {}
            }
        }
        Ok(scored)
    }
}

// ---------------------------------------------------------------------------
// MULTIPLE_OPTIONS
// ---------------------------------------------------------------------------

/// Scores grid answers: per row, the chosen column.
#[derive(Debug, Default)]
pub struct GridScorer;

impl ScoringStrategy for GridScorer {
    fn name(&self) -> &str {
        "grid"
    }

    fn score(&self, test: Option<&SingleTest>, answer: &Answer) -> Result<Scored, ScoringError> {
        let test = test.ok_or(ScoringError::ConfigMissing)?;
        let mut scored = Scored::new(self.max_score(test));
        let Some(elements) = answer_elements(test, answer, &mut scored) else {
            return Ok(scored);
        };

        for (index, option) in test.options.iter().enumerate() {
            let expected = match &option.correct {
                Some(value) if option.carries_correct() => value.as_text(),
                _ => {
                    scored.skip(test, index, "option has no correct column");
                    continue;
                }
            };
            let chosen = match elements.get(index) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(other) => {
                    scored.skip(test, index, &format!("expected a column, found {other}"));
                    continue;
                }
            };
            if chosen.as_deref() == Some(expected.as_str()) {
                scored.hit(index);
            } else {
                scored.miss(index);
            }
        }
        Ok(scored)
    }
}

// ---------------------------------------------------------------------------
// SPEED
// ---------------------------------------------------------------------------

/// Span recorded when the user made no selection.
const NO_SELECTION: (i64, i64) = (-1, -1);

/// Scores text-span answers against the `index`-th occurrence of the
/// option's `correct` substring.
///
/// Offsets are character offsets into the option text; spans are end
/// exclusive.
#[derive(Debug, Default)]
pub struct SpeedScorer;

impl ScoringStrategy for SpeedScorer {
    fn name(&self) -> &str {
        "speed"
    }

    fn score(&self, test: Option<&SingleTest>, answer: &Answer) -> Result<Scored, ScoringError> {
        let test = test.ok_or(ScoringError::ConfigMissing)?;
        let mut scored = Scored::new(self.max_score(test));
        let Some(elements) = answer_elements(test, answer, &mut scored) else {
            return Ok(scored);
        };

        for (index, option) in test.options.iter().enumerate() {
            let Some(element) = elements.get(index) else {
                continue;
            };
            match judge_span(option, element) {
                Ok(SpanVerdict::NoSelection) => {}
                Ok(SpanVerdict::Hit) => scored.hit(index),
                Ok(SpanVerdict::Miss) => scored.miss(index),
                Err(reason) => scored.skip(test, index, &reason),
            }
        }
        Ok(scored)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SpanVerdict {
    NoSelection,
    Hit,
    Miss,
}

fn judge_span(option: &TestOption, element: &Value) -> Result<SpanVerdict, String> {
    let (start, end) = parse_span(element)?;
    if (start, end) == NO_SELECTION {
        return Ok(SpanVerdict::NoSelection);
    }

    let needle: Vec<char> = match &option.correct {
        Some(CorrectValue::Text(s)) => s.chars().collect(),
        Some(CorrectValue::Number(n)) => n.to_string().chars().collect(),
        _ => return Err("option has no correct substring".into()),
    };
    if needle.is_empty() {
        return Err("correct substring is empty".into());
    }

    let occurrence = match &option.index {
        None => 0,
        Some(index) => index
            .resolve()
            .ok_or_else(|| format!("unparsable occurrence index {index:?}"))?,
    };

    let text: Vec<char> = option.text.chars().collect();
    if start < 0 || end < start || end as usize > text.len() {
        return Err(format!(
            "span [{start}, {end}] outside text of length {}",
            text.len()
        ));
    }
    let (start, end) = (start as usize, end as usize);

    let occurrences = find_occurrences(&text, &needle);
    let Some(&(target_start, target_end)) = occurrences.get(occurrence) else {
        return Err(format!(
            "occurrence {occurrence} requested but only {} found",
            occurrences.len()
        ));
    };

    let covers_target = start <= target_start && end >= target_end;
    let selection_contains = contains(&text[start..end], &needle);
    if covers_target && selection_contains {
        Ok(SpanVerdict::Hit)
    } else {
        Ok(SpanVerdict::Miss)
    }
}

/// Parse a two-element numeric span.
fn parse_span(element: &Value) -> Result<(i64, i64), String> {
    let Value::Array(pair) = element else {
        return Err(format!("expected a [start, end] span, found {element}"));
    };
    if pair.len() != 2 {
        return Err(format!("expected two span offsets, found {}", pair.len()));
    }
    let offset = |v: &Value| -> Result<i64, String> {
        if let Some(n) = v.as_i64() {
            return Ok(n);
        }
        match v.as_f64() {
            Some(f) if f.fract() == 0.0 => Ok(f as i64),
            _ => Err(format!("span offset {v} is not an integer")),
        }
    };
    Ok((offset(&pair[0])?, offset(&pair[1])?))
}

/// Non-overlapping occurrences of `needle` in `text`, scanned left to right,
/// as `[start, end)` character ranges.
fn find_occurrences(text: &[char], needle: &[char]) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut i = 0;
    while i + needle.len() <= text.len() {
        if text[i..].starts_with(needle) {
            found.push((i, i + needle.len()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    found
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps each category to its scoring strategy.
#[derive(Clone)]
pub struct ScorerRegistry {
    strategies: HashMap<Category, Arc<dyn ScoringStrategy>>,
}

impl ScorerRegistry {
    /// A registry with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// The registry covering all five categories.
    pub fn standard() -> Self {
        let choice: Arc<dyn ScoringStrategy> = Arc::new(ChoiceScorer);
        let mut registry = Self::empty();
        registry.register(Category::Checkbox, Arc::clone(&choice));
        registry.register(Category::RadioButtons, Arc::clone(&choice));
        registry.register(Category::MultipleChoice, choice);
        registry.register(Category::MultipleOptions, Arc::new(GridScorer));
        registry.register(Category::Speed, Arc::new(SpeedScorer));
        registry
    }

    pub fn register(&mut self, category: Category, strategy: Arc<dyn ScoringStrategy>) {
        self.strategies.insert(category, strategy);
    }

    pub fn get(&self, category: Category) -> Option<&dyn ScoringStrategy> {
        self.strategies.get(&category).map(|s| s.as_ref())
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<_> = self.strategies.keys().collect();
        categories.sort();
        f.debug_struct("ScorerRegistry")
            .field("categories", &categories)
            .finish()
    }
}
