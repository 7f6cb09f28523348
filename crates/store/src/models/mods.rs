use super::{Entity, Id, timestamp};
use crate::error::Error;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mod {
    pub id: Id,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub website: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ModRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    author: Option<String>,
    website: Option<String>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<ModRow> for Mod {
    type Error = Error;
    fn try_from(row: ModRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            author: row.author,
            website: row.website,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Mod {
    const TABLE: &'static str = "mods";
    const KIND: &'static str = "mod";
    type Row = ModRow;

    fn id(&self) -> Id {
        self.id
    }
}
