use super::{Attachment, Entity, Id, timestamp};
use crate::error::Error;
use serde::Serialize;
use time::OffsetDateTime;

/// One released file of a mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub id: Id,
    pub mod_id: Id,
    pub name: String,
    pub slug: String,
    /// Metadata-only versions have no file.
    pub file: Option<Attachment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct VersionRow {
    id: i64,
    mod_id: i64,
    name: String,
    slug: String,
    file_md5: Option<String>,
    file_content_type: Option<String>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<VersionRow> for Version {
    type Error = Error;
    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            mod_id: row.mod_id,
            name: row.name,
            slug: row.slug,
            file: Attachment::from_columns(row.file_md5, row.file_content_type),
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Version {
    const TABLE: &'static str = "versions";
    const KIND: &'static str = "version";
    type Row = VersionRow;

    fn id(&self) -> Id {
        self.id
    }
}
