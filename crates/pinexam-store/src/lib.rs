//! pinexam-store: Storage accessors and configuration.
//!
//! Implements the `ConfigSource`, `JournalStore` and `ResultStore` traits of
//! `pinexam-core` on the filesystem and in memory, and loads the
//! `pinexam.toml` configuration that selects between them.

pub mod config;
pub mod file;
pub mod memory;

pub use config::{create_stores, load_config, PinexamConfig, StoreKind, Stores};
pub use file::FileStore;
pub use memory::MemoryStore;
