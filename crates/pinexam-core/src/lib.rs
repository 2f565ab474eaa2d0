//! pinexam-core: Assessment engine, storage traits, and scoring.
//!
//! This crate validates course configurations, builds user-specific journal
//! structures, scores recorded answers and generates the validation code that
//! freezes a result. [`service::AssessmentService`] layers the stateful
//! workflows on top of the storage traits in [`traits`].

pub mod calculator;
pub mod code;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod journal;
pub mod model;
pub mod report;
pub mod results;
pub mod scoring;
pub mod service;
pub mod structure;
pub mod traits;
pub mod validator;
