//! Entity store for solder.
//!
//! Everything that lives in the SQLite database goes through this crate:
//! - [`repo`]: one repository per entity kind, resolving ids or slugs and
//!   writing uploads to the artifact store before the row that references them.
//! - [`association`]: the link/unlink protocol shared by every relation.
//! - [`manifest`]: the read-only documents served to launchers.
//!
//! Deletes never cascade. A row that is still linked or still owns children
//! cannot be deleted until those are unlinked or deleted first.

pub mod association;
mod db;
pub mod error;
pub mod manifest;
pub mod models;
pub mod repo;
mod table;

pub use crate::association::{AssociationTable, Link, Relation};
pub use crate::db::Database;
pub use crate::manifest::{BuildManifest, ManifestSynthesizer, ModEntry, PackManifest};
pub use crate::repo::{Store, Upload};
