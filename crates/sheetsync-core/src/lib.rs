//! Core layer of sheetsync
//!
//! Keeps a directory of TSV/CSV tables in sync with the tabs of one remote
//! spreadsheet. This crate implements:
//!
//! - **Manifest store**: the typed `.sheetsync/` tables describing tracked
//!   sheets, fields and cell attributes
//! - **Range aggregation**: compressing per-cell attributes into A1 ranges
//! - **Reconciliation engine**: classifying every sheet as added, removed,
//!   renamed, modified or unchanged on either side
//! - **Sync orchestrators**: `fetch`, `push` and `pull`
//! - **Project operations**: `init`, `add`, `rm`, `mv`, `ignore`, `apply`,
//!   `clear`
//!
//! # Architecture
//!
//! ```text
//!                  sheetsync-cli
//!                        |
//!                 sheetsync-core
//!                        |
//!          +-------------+-------------+
//!          |                           |
//!     sheetsync-fs              sheetsync-table
//! ```
//!
//! Every operation takes a [`ProjectContext`], built once per command. The
//! remote is reached only through the [`Spreadsheet`] trait.

pub mod aggregate;
pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod manifest;
pub mod naming;
pub mod project;
pub mod remote;
pub mod status;
pub mod sync;
pub mod validation;

pub use config::ProjectConfig;
pub use context::{Access, ProjectContext};
pub use error::{Error, RemoteError, Result};
pub use manifest::{Manifest, ManifestStore, SheetRecord};
pub use remote::{FileSpreadsheet, MemorySpreadsheet, Spreadsheet};
pub use status::{ChangeKind, SheetDiff, SheetStatus, StatusReport, diff, status};
pub use sync::{FetchReport, PullReport, PushReport, fetch, pull, push};
