//! Project operations outside the sync cycle
//!
//! Creating a project and editing what it tracks: `init`, `add`, `rm`,
//! `mv`, `ignore`, `ls`, `apply` and `clear`, plus `delete` to tear it all
//! down. Only `init` and `delete` call the remote.

mod apply;
mod clear;
mod delete;
mod init;
mod sheets;

pub use apply::{ApplyReport, apply};
pub use clear::{ClearTarget, clear};
pub use delete::delete;
pub use init::{InitOptions, init};
pub use sheets::{AddOptions, MoveOutcome, SheetListing, add, ignore, list, mv, rm, unignore};
