//! Tech debt report - one ranked report for a whole multi-module build
//!
//! Consolidates tech debt markers recorded across the modules of a build into
//! a single self-contained HTML report.
//!
//! # Features
//!
//! - Read per-module JSON shards emitted by the annotation front end
//! - Extract TODO/FIXME comments and attribute them to the owning module
//! - Merge items reported by several compilation targets into one
//! - Attach last author and modification time using git blame
//! - Render summary tiles and collapsible cards, or JSON
//!
//! # Example
//!
//! ```rust,no_run
//! use techdebt_report::*;
//!
//! // Load configuration
//! let config = config::load_config(None).unwrap();
//!
//! // Collect, merge, enrich and write the report
//! let outcome = pipeline::run(&config).unwrap();
//! println!("{} items in {}", outcome.items.len(), outcome.output.display());
//! ```

pub mod aggregate;
pub mod cli;
pub mod collector;
pub mod config;
pub mod discover;
pub mod error;
pub mod git;
pub mod models;
pub mod pipeline;
pub mod reporter;
pub mod resolver;
pub mod scanner;

// Re-export commonly used types
pub use error::{Diagnostic, ReportError};
pub use models::{DebtItem, GitInfo, ItemType, Priority, ReportConfig};
