//! Store configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pinexam_core::service::AssessmentService;
use pinexam_core::traits::{ConfigSource, JournalStore, ResultStore};

use crate::file::FileStore;
use crate::memory::MemoryStore;

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSON files under `data_dir`.
    #[default]
    File,
    /// Process-local maps; nothing survives the process.
    Memory,
}

/// Top-level pinexam configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinexamConfig {
    #[serde(default)]
    pub store: StoreKind,
    /// Where journals and results are written.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where course documents are read from.
    #[serde(default = "default_courses_dir")]
    pub courses_dir: PathBuf,
    /// Language used when a command does not name one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./pinexam-data")
}
fn default_courses_dir() -> PathBuf {
    PathBuf::from("./courses")
}
fn default_language() -> String {
    "en".to_string()
}
fn default_log_filter() -> String {
    "pinexam=info".to_string()
}

impl Default for PinexamConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            data_dir: default_data_dir(),
            courses_dir: default_courses_dir(),
            default_language: default_language(),
            log_filter: default_log_filter(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `pinexam.toml` in the current directory
/// 2. `~/.config/pinexam/config.toml`
///
/// Environment variable overrides: `PINEXAM_DATA_DIR`, `PINEXAM_COURSES_DIR`.
pub fn load_config() -> Result<PinexamConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PinexamConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("pinexam.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<PinexamConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            config
        }
        None => PinexamConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("PINEXAM_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("PINEXAM_COURSES_DIR") {
        config.courses_dir = PathBuf::from(dir);
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.courses_dir = resolve_path(&config.courses_dir);
    config.log_filter = resolve_env_vars(&config.log_filter);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pinexam"))
}

/// The three accessors a service needs.
#[derive(Clone)]
pub struct Stores {
    pub configs: Arc<dyn ConfigSource>,
    pub journals: Arc<dyn JournalStore>,
    pub results: Arc<dyn ResultStore>,
}

impl Stores {
    /// Share one backend for all three accessors.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ConfigSource + JournalStore + ResultStore + 'static,
    {
        Self {
            configs: backend.clone(),
            journals: backend.clone(),
            results: backend,
        }
    }

    pub fn into_service(self) -> AssessmentService {
        AssessmentService::new(self.configs, self.journals, self.results)
    }
}

/// Create the accessors selected by `config`.
///
/// The memory backend is seeded with every course document found under
/// `courses_dir`.
pub fn create_stores(config: &PinexamConfig) -> Result<Stores> {
    match config.store {
        StoreKind::File => {
            let store = FileStore::new(&config.courses_dir, &config.data_dir);
            Ok(Stores::from_backend(Arc::new(store)))
        }
        StoreKind::Memory => {
            let store = MemoryStore::new();
            if config.courses_dir.is_dir() {
                let courses = FileStore::new(&config.courses_dir, &config.data_dir);
                for course in courses.list_courses()? {
                    let doc = courses.read_course_document(&course.name, &course.language)?;
                    store.insert_course_json(&course.name, &course.language, &doc)?;
                }
            }
            Ok(Stores::from_backend(Arc::new(store)))
        }
    }
}
