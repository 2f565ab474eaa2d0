//! Result sheets with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluation::{summarize, SetSummary};
use crate::journal::Pin;
use crate::results::{ResultRecord, ResultSet};
use crate::structure::JournalStructure;

/// Everything a user gets to see once they have finished a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSheet {
    /// Unique sheet identifier.
    pub id: Uuid,
    /// When the sheet was created.
    pub created_at: DateTime<Utc>,
    pub pin: Pin,
    pub course_title: String,
    /// Per-set totals and evaluation texts.
    pub summaries: Vec<SetSummary>,
    /// Detailed per-test results.
    pub sets: Vec<ResultSet>,
    /// Present once the results are locked.
    #[serde(default)]
    pub validation_code: Option<String>,
}

impl ResultSheet {
    pub fn new(
        pin: Pin,
        course_title: impl Into<String>,
        structure: &JournalStructure,
        record: ResultRecord,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            pin,
            course_title: course_title.into(),
            summaries: summarize(structure, &record.tests),
            sets: record.tests,
            validation_code: record.validation_code,
        }
    }

    pub fn total_score(&self) -> u32 {
        self.summaries.iter().map(|s| s.score).sum()
    }

    pub fn total_max_score(&self) -> u32 {
        self.summaries.iter().map(|s| s.max_score).sum()
    }

    pub fn is_locked(&self) -> bool {
        self.validation_code.is_some()
    }

    /// Save the sheet as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result sheet")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result sheet to {}", path.display()))?;
        Ok(())
    }

    /// Load a sheet from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result sheet from {}", path.display()))?;
        let sheet: ResultSheet =
            serde_json::from_str(&content).context("failed to parse result sheet JSON")?;
        Ok(sheet)
    }

    /// Format the sheet as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.course_title));
        md.push_str(&format!(
            "**Pin:** {} | **Score:** {}/{}\n\n",
            self.pin,
            self.total_score(),
            self.total_max_score()
        ));

        md.push_str("| Set | Score | Max | Percent | Evaluation |\n");
        md.push_str("|-----|-------|-----|---------|------------|\n");
        for s in &self.summaries {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% | {} |\n",
                s.id,
                s.score,
                s.max_score,
                s.percent,
                s.threshold_text.as_deref().unwrap_or("-")
            ));
        }
        md.push('\n');

        match &self.validation_code {
            Some(code) => md.push_str(&format!("**Validation code:** `{code}`\n")),
            None => md.push_str("_Results are not locked yet._\n"),
        }

        md
    }
}
