//! Upstream Minecraft and Forge releases.
//!
//! Both are keyed on their external version string (`name`) and are only
//! ever created or refreshed through a sync.

use super::{Entity, Id, timestamp};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Minecraft {
    pub id: Id,
    /// Release id as published upstream, e.g. `1.12.2`.
    pub name: String,
    /// `release`, `snapshot`, `old_beta`, ...
    pub kind: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MinecraftRow {
    id: i64,
    name: String,
    kind: String,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<MinecraftRow> for Minecraft {
    type Error = Error;
    fn try_from(row: MinecraftRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            kind: row.kind,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Minecraft {
    const TABLE: &'static str = "minecrafts";
    const KIND: &'static str = "minecraft release";
    type Row = MinecraftRow;

    fn id(&self) -> Id {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forge {
    pub id: Id,
    /// Forge version number, e.g. `14.23.5.2847`.
    pub name: String,
    /// Minecraft version this Forge release targets.
    pub minecraft: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ForgeRow {
    id: i64,
    name: String,
    minecraft: String,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<ForgeRow> for Forge {
    type Error = Error;
    fn try_from(row: ForgeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            minecraft: row.minecraft,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
        })
    }
}
impl Entity for Forge {
    const TABLE: &'static str = "forges";
    const KIND: &'static str = "forge release";
    type Row = ForgeRow;

    fn id(&self) -> Id {
        self.id
    }
}

/// Externally fetched Minecraft release, as handed to a sync.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MinecraftRelease {
    #[serde(alias = "id")]
    pub name: String,
    #[serde(alias = "type")]
    pub kind: String,
}

/// Externally fetched Forge release, as handed to a sync.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgeRelease {
    pub name: String,
    pub minecraft: String,
}
