use super::{Attachment, Entity, Id, timestamp};
use crate::error::Error;
use serde::Serialize;
use time::OffsetDateTime;

/// A named bundle of builds distributed to launcher users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pack {
    pub id: Id,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    /// Hidden packs are left out of the public pack listing.
    pub hidden: bool,
    pub logo: Option<Attachment>,
    pub recommended_id: Option<Id>,
    pub latest_id: Option<Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PackRow {
    id: i64,
    name: String,
    slug: String,
    website: Option<String>,
    hidden: bool,
    logo_md5: Option<String>,
    logo_content_type: Option<String>,
    recommended_id: Option<i64>,
    latest_id: Option<i64>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<PackRow> for Pack {
    type Error = Error;
    fn try_from(row: PackRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            website: row.website,
            hidden: row.hidden,
            logo: Attachment::from_columns(row.logo_md5, row.logo_content_type),
            recommended_id: row.recommended_id,
            latest_id: row.latest_id,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Pack {
    const TABLE: &'static str = "packs";
    const KIND: &'static str = "pack";
    type Row = PackRow;

    fn id(&self) -> Id {
        self.id
    }
}
