#![forbid(unsafe_code)]

//! Core domain model and business logic for the gym content planner.
//!
//! This crate provides:
//! - Domain types (schedule days, exercise logs, variant choices)
//! - The built-in exercise catalog and label composition
//! - Month calendar aggregation and day status
//! - The planner view state with write-through mutations
//! - Backend collaborators (local files, hosted REST service)
//! - Configuration, logging and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod calendar;
pub mod config;
pub mod logging;
pub mod document;
pub mod backend;
pub mod local;
pub mod remote;
pub mod planner;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, EmptySelection, ExerciseCatalog};
pub use calendar::{MonthGrid, MonthSummary, WeekStart, YearMonth};
pub use config::Config;
pub use backend::Backend;
pub use planner::{LogEdit, LogEntry, Planner};
pub use history::{count_drafted_ideas, load_gallery, load_history, HistoryEntry};
