//! Tables as sheetsync sees them
//!
//! This crate knows nothing about manifests or remotes. It provides:
//!
//! - **address**: A1-style cell addresses and rectangular ranges
//! - **grid**: reading and writing TSV/CSV files as string grids
//! - **diff**: the highlighted row-level table diff (`TableDiff`)
//! - **render**: laying a diff out as aligned text lines for display

pub mod address;
pub mod diff;
pub mod error;
pub mod grid;
pub mod render;

pub use address::{CellAddress, CellRange};
pub use diff::{DiffTag, TableDiff};
pub use error::{Error, Result};
pub use grid::Grid;
pub use render::{LineKind, RenderedLine, render_diff};
