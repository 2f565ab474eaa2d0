//! The `pinexam courses` command.

use std::path::PathBuf;

use anyhow::Result;

use pinexam_store::config::load_config_from;
use pinexam_store::FileStore;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = FileStore::new(&config.courses_dir, &config.data_dir);
    let courses = store.list_courses()?;

    if courses.is_empty() {
        println!(
            "No courses found in {}. Run `pinexam init` to create a demo course.",
            config.courses_dir.display()
        );
        return Ok(());
    }

    for course in &courses {
        println!("{course}");
    }

    Ok(())
}
