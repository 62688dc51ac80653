//! Filesystem primitives for sheetsync projects
//!
//! Provides normalized path handling, atomic locked writes, content checksums
//! and the advisory lock that serializes sync commands against one project.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use constants::ProjectPath;
pub use error::{Error, Result};
pub use lock::ProjectLock;
pub use path::NormalizedPath;
