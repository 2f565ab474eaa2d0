//! Id-indexed lookup tables over a course configuration.

use std::collections::HashMap;

use crate::model::{CourseConfig, InfoPage, SingleTest, TestGroup};

/// Lookup tables built once per operation so that resolution is linear in
/// the number of elements.
pub struct ConfigIndex<'a> {
    tests: HashMap<&'a str, &'a SingleTest>,
    groups: HashMap<&'a str, &'a TestGroup>,
    pages_by_owner: HashMap<&'a str, Vec<&'a InfoPage>>,
}

impl<'a> ConfigIndex<'a> {
    pub fn new(config: &'a CourseConfig) -> Self {
        let tests = config.tests.iter().map(|t| (t.id.as_str(), t)).collect();
        let groups = config
            .testgroups
            .iter()
            .map(|g| (g.id.as_str(), g))
            .collect();

        let mut pages_by_owner: HashMap<&str, Vec<&InfoPage>> = HashMap::new();
        for page in &config.infopages {
            for owner in &page.belongs {
                pages_by_owner.entry(owner.as_str()).or_default().push(page);
            }
        }

        Self {
            tests,
            groups,
            pages_by_owner,
        }
    }

    pub fn test(&self, id: &str) -> Option<&'a SingleTest> {
        self.tests.get(id).copied()
    }

    pub fn group(&self, id: &str) -> Option<&'a TestGroup> {
        self.groups.get(id).copied()
    }

    /// Info pages that must be shown before `owner`, in declaration order.
    pub fn pages_for(&self, owner: &str) -> &[&'a InfoPage] {
        self.pages_by_owner
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
