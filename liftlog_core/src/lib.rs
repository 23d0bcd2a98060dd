#![forbid(unsafe_code)]

//! Core domain model and business logic for the Liftlog workout tracker.
//!
//! This crate provides:
//! - Domain types (exercises, templates, workouts, sets, routines)
//! - Persistent collection store
//! - Sequential schema-migration engine
//! - Domain repositories with cascade rules
//! - Volume analytics (weekly volume, training score, records, trends)
//! - Exercise suggestions for weekly shortfalls
//! - JSON/CSV export

pub mod types;
pub mod error;
pub mod store;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod migrate;
pub mod repository;
pub mod volume;
pub mod suggest;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use store::Store;
pub use catalog::build_default_catalog;
pub use config::Config;
pub use migrate::{Migrator, MigrationOutcome, CURRENT_VERSION};
pub use repository::Repositories;
pub use volume::{
    aggregate_into_categories, personal_records, projected_volume, training_score,
    volume_for_range, volume_history, volume_trends, weekly_volume, MuscleVolume, WeeklyVolume,
};
pub use suggest::{shortfalls, suggest_exercises, ExerciseSuggestion, Shortfall};
pub use export::{export_document, export_sets_csv, import_document, ExportDocument};
