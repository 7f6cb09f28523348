use super::{Entity, Id, timestamp};
use crate::error::Error;
use serde::Serialize;
use time::OffsetDateTime;

/// One installable configuration of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Build {
    pub id: Id,
    pub pack_id: Id,
    pub name: String,
    pub slug: String,
    /// Required on create; only cleared by unlinking the Minecraft release.
    pub minecraft_id: Option<Id>,
    pub forge_id: Option<Id>,
    pub min_java: Option<String>,
    pub min_memory: Option<String>,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct BuildRow {
    id: i64,
    pack_id: i64,
    minecraft_id: Option<i64>,
    forge_id: Option<i64>,
    name: String,
    slug: String,
    min_java: Option<String>,
    min_memory: Option<String>,
    published: bool,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<BuildRow> for Build {
    type Error = Error;
    fn try_from(row: BuildRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            pack_id: row.pack_id,
            name: row.name,
            slug: row.slug,
            minecraft_id: row.minecraft_id,
            forge_id: row.forge_id,
            min_java: row.min_java,
            min_memory: row.min_memory,
            published: row.published,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Build {
    const TABLE: &'static str = "builds";
    const KIND: &'static str = "build";
    type Row = BuildRow;

    fn id(&self) -> Id {
        self.id
    }
}
