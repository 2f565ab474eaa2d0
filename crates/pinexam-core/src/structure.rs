//! Journal structure building.
//!
//! A journal structure is the concrete, ordered list of pages a user works
//! through: groups are expanded to the tests drawn for this user and info
//! pages are inlined immediately before the content they belong to.
//!
//! Building is a pure function of the configuration, an optional prior
//! [`MinimalStructure`] and a caller-supplied random source. With a prior
//! structure (resume) no randomness is consumed and the result is the same
//! structure the user was originally given.

use std::collections::HashMap;

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::index::ConfigIndex;
use crate::model::{CourseConfig, EvaluationTexts, InfoPage, SingleTest, TestGroup};

/// The resolved, ordered structure of a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalStructure {
    pub sets: Vec<StructureSet>,
}

/// One test set with its fully expanded element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSet {
    pub id: String,
    pub elements: Vec<StructureElement>,
    #[serde(default)]
    pub evaluation: EvaluationTexts,
}

/// A page of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StructureElement {
    Test(SingleTest),
    Info(InfoPage),
}

impl StructureElement {
    pub fn as_test(&self) -> Option<&SingleTest> {
        match self {
            StructureElement::Test(test) => Some(test),
            StructureElement::Info(_) => None,
        }
    }
}

impl StructureSet {
    /// Tests of this set, in order, skipping info pages.
    pub fn tests(&self) -> impl Iterator<Item = &SingleTest> {
        self.elements.iter().filter_map(StructureElement::as_test)
    }
}

impl JournalStructure {
    pub fn set(&self, id: &str) -> Option<&StructureSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    /// Look up a test by set and test id.
    pub fn test(&self, set: &str, test: &str) -> Option<&SingleTest> {
        self.set(set)?.tests().find(|t| t.id == test)
    }

    /// Number of tests across all sets.
    pub fn test_count(&self) -> usize {
        self.sets.iter().map(|s| s.tests().count()).sum()
    }
}

/// The persisted, compact form of a structure: per set, the chosen test ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinimalStructure {
    pub sets: Vec<MinimalSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalSet {
    pub id: String,
    pub tests: Vec<String>,
}

impl MinimalStructure {
    pub fn set(&self, id: &str) -> Option<&MinimalSet> {
        self.sets.iter().find(|s| s.id == id)
    }
}

impl From<&JournalStructure> for MinimalStructure {
    fn from(structure: &JournalStructure) -> Self {
        MinimalStructure {
            sets: structure
                .sets
                .iter()
                .map(|set| MinimalSet {
                    id: set.id.clone(),
                    tests: set.tests().map(|t| t.id.clone()).collect(),
                })
                .collect(),
        }
    }
}

/// How group members are chosen during expansion.
enum GroupResolution<'a> {
    /// Fresh start: per group, the ids drawn for this call.
    Drawn(HashMap<&'a str, Vec<&'a str>>),
    /// Resume: the ids recorded for each set.
    Recorded(&'a MinimalStructure),
}

/// The recorded test ids of one set, consumed in order while the set's
/// elements are walked.
struct RecordedTests<'m> {
    ids: &'m [String],
    pos: usize,
}

impl<'m> RecordedTests<'m> {
    fn new(ids: &'m [String]) -> Self {
        Self { ids, pos: 0 }
    }

    /// A standalone test occupies its own slot.
    fn take_test(&mut self, id: &str) {
        if self.ids.get(self.pos).is_some_and(|recorded| recorded == id) {
            self.pos += 1;
        }
    }

    /// The members of `group` recorded at the current position: at most
    /// `select` ids (all members without `select`), in declared order.
    fn take_group<'g>(&mut self, group: &'g TestGroup) -> Vec<&'g str> {
        let limit = group.select.unwrap_or(group.tests.len());
        let mut members = Vec::new();
        let mut next = 0;
        while members.len() < limit {
            let Some(recorded) = self.ids.get(self.pos) else {
                break;
            };
            let Some(offset) = group.tests[next..].iter().position(|t| t == recorded) else {
                break;
            };
            members.push(group.tests[next + offset].as_str());
            next += offset + 1;
            self.pos += 1;
        }
        members
    }
}

/// Build the journal structure for `config`.
///
/// Without `prior`, each group with a `select` count is reduced to that many
/// distinct tests drawn uniformly from `rng`; the drawn tests keep their
/// declared order. With `prior`, the recorded test ids of each set are
/// replayed in order against the set's elements and `rng` is left untouched.
pub fn build_structure<R: Rng + ?Sized>(
    config: &CourseConfig,
    prior: Option<&MinimalStructure>,
    rng: &mut R,
) -> Result<JournalStructure, BuildError> {
    let index = ConfigIndex::new(config);

    let resolution = match prior {
        Some(minimal) => GroupResolution::Recorded(minimal),
        None => GroupResolution::Drawn(draw_groups(config, rng)?),
    };

    let mut sets = Vec::with_capacity(config.sets.len());
    for set in &config.sets {
        let mut recorded = match &resolution {
            GroupResolution::Recorded(minimal) => {
                let entry = minimal.set(&set.id).ok_or_else(|| BuildError::ResumeMismatch {
                    set: set.id.clone(),
                })?;
                Some(RecordedTests::new(&entry.tests))
            }
            GroupResolution::Drawn(_) => None,
        };

        let mut elements = Vec::new();
        push_pages(&mut elements, &index, &set.id);

        for element_id in &set.elements {
            if let Some(test) = index.test(element_id) {
                if let Some(recorded) = recorded.as_mut() {
                    recorded.take_test(&test.id);
                }
                push_test(&mut elements, &index, test);
            } else if let Some(group) = index.group(element_id) {
                push_pages(&mut elements, &index, &group.id);
                let members: Vec<&str> = match (&resolution, recorded.as_mut()) {
                    (GroupResolution::Drawn(drawn), _) => drawn
                        .get(group.id.as_str())
                        .cloned()
                        .unwrap_or_else(|| group.tests.iter().map(String::as_str).collect()),
                    (GroupResolution::Recorded(_), Some(recorded)) => recorded.take_group(group),
                    (GroupResolution::Recorded(_), None) => Vec::new(),
                };
                for member in members {
                    let test = index
                        .test(member)
                        .ok_or_else(|| BuildError::UnknownGroupTest {
                            group: group.id.clone(),
                            test: member.to_string(),
                        })?;
                    push_test(&mut elements, &index, test);
                }
            } else {
                return Err(BuildError::UnknownElement {
                    set: set.id.clone(),
                    element: element_id.clone(),
                });
            }
        }

        tracing::debug!(set = %set.id, elements = elements.len(), "expanded test set");
        sets.push(StructureSet {
            id: set.id.clone(),
            elements,
            evaluation: set.evaluation.clone(),
        });
    }

    Ok(JournalStructure { sets })
}

/// Draw the members of every group that declares a `select` count.
fn draw_groups<'a, R: Rng + ?Sized>(
    config: &'a CourseConfig,
    rng: &mut R,
) -> Result<HashMap<&'a str, Vec<&'a str>>, BuildError> {
    let mut drawn = HashMap::new();
    for group in &config.testgroups {
        if let Some(select) = group.select {
            drawn.insert(group.id.as_str(), draw_group(group, select, rng)?);
        }
    }
    Ok(drawn)
}

fn draw_group<'a, R: Rng + ?Sized>(
    group: &'a TestGroup,
    select: usize,
    rng: &mut R,
) -> Result<Vec<&'a str>, BuildError> {
    let available = group.tests.len();
    if select > available {
        return Err(BuildError::SelectionTooLarge {
            group: group.id.clone(),
            select,
            available,
        });
    }

    let mut picked = sample(rng, available, select).into_vec();
    picked.sort_unstable();
    Ok(picked.into_iter().map(|i| group.tests[i].as_str()).collect())
}

fn push_pages(elements: &mut Vec<StructureElement>, index: &ConfigIndex<'_>, owner: &str) {
    elements.extend(
        index
            .pages_for(owner)
            .iter()
            .map(|page| StructureElement::Info((*page).clone())),
    );
}

fn push_test(elements: &mut Vec<StructureElement>, index: &ConfigIndex<'_>, test: &SingleTest) {
    push_pages(elements, index, &test.id);
    elements.push(StructureElement::Test(test.clone()));
}
