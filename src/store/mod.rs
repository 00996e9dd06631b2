//! Versioned artifact store.
//!
//! Versions are never recorded separately: they are derived from the
//! `<version>.full` / `<version>.diff` files present in a directory.

pub mod artifact;
pub mod plan;
pub mod version;

pub use artifact::{artifact_name, parse_artifact_name, temp_name, ArtifactKind};
pub use plan::{RestoreMode, RestorePlan};
pub use version::VersionStore;
