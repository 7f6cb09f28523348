//! Domain models and their database rows.
//!
//! Rows mirror table columns exactly (unix timestamps, nullable artifact
//! columns); models are what the rest of the system sees. Conversions from
//! row to model are fallible because stored data can be corrupt.

mod build;
mod identity;
mod mods;
mod pack;
mod release;
mod version;

pub use self::build::{Build, BuildRow};
pub use self::identity::{Client, Clients, Identity, IdentityKind, IdentityRow, Team, Teams, User, Users};
pub use self::mods::{Mod, ModRow};
pub use self::pack::{Pack, PackRow};
pub use self::release::{Forge, ForgeRelease, ForgeRow, Minecraft, MinecraftRelease, MinecraftRow};
pub use self::version::{Version, VersionRow};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use solder_storage::{Artifact, Category};
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

/// Database-generated identifier.
pub type Id = i64;

/// Anything that lives in its own table and can sit on either side of an
/// association.
pub trait Entity: TryFrom<Self::Row, Error = Error> + Send + Unpin + 'static {
    /// Table holding this entity. Every such table has `id` and `name`.
    const TABLE: &'static str;
    /// Singular noun used in error messages.
    const KIND: &'static str;
    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin;

    fn id(&self) -> Id;
}

/// Reference to a stored artifact as persisted on an entity row.
///
/// The category is implied by the owning entity (logo for packs, file for
/// versions), so only the hash and content type are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub md5: String,
    pub content_type: String,
}
impl Attachment {
    pub(crate) fn from_columns(md5: Option<String>, content_type: Option<String>) -> Option<Self> {
        match (md5, content_type) {
            (Some(md5), Some(content_type)) => Some(Self { md5, content_type }),
            _ => None,
        }
    }

    pub fn artifact(&self, category: Category) -> Artifact {
        Artifact {
            category,
            hash: self.md5.clone(),
            content_type: self.content_type.clone(),
        }
    }
}
impl From<Artifact> for Attachment {
    fn from(artifact: Artifact) -> Self {
        Self { md5: artifact.hash, content_type: artifact.content_type }
    }
}

pub(crate) fn timestamp(seconds: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData("timestamp"))
}

pub(crate) fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
