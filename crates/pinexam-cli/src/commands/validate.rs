//! The `pinexam validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use pinexam_core::error::ValidationError;
use pinexam_core::validator::{find_course_files, parse_course_config};

pub fn execute(course_path: PathBuf) -> Result<()> {
    let files = if course_path.is_dir() {
        find_course_files(&course_path)?
    } else {
        vec![course_path]
    };

    let mut invalid = 0;

    for path in &files {
        if !check_file(path)? {
            invalid += 1;
        }
    }

    if invalid == 0 {
        println!("All course documents valid.");
        Ok(())
    } else {
        anyhow::bail!("{invalid} of {} course document(s) invalid", files.len())
    }
}

/// Print the verdict for one file. Returns whether it is valid.
fn check_file(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file: {}", path.display()))?;

    let doc: Value = match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            println!("{}: INVALID", path.display());
            println!("  not valid JSON: {e}");
            return Ok(false);
        }
    };

    match parse_course_config(&doc) {
        Ok(config) => {
            println!(
                "{}: {} ({} tests, {} sets)",
                path.display(),
                config.title,
                config.tests.len(),
                config.sets.len()
            );
            Ok(true)
        }
        Err(ValidationError::Structural(violations)) => {
            println!("{}: INVALID", path.display());
            for v in &violations {
                println!("  {v}");
            }
            Ok(false)
        }
        Err(ValidationError::Semantic(violation)) => {
            println!("{}: INVALID", path.display());
            println!("  {violation}");
            Ok(false)
        }
    }
}
