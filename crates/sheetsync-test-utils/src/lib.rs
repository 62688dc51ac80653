//! Shared test utilities for the sheetsync workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`](project::TestProject), an initialized
//!   project in a temp dir backed by an in-memory spreadsheet

pub mod project;

pub use project::TestProject;
