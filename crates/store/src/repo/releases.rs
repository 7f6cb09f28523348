//! Minecraft and Forge releases, kept in step with an upstream feed.

use crate::association::{AssociationTable, ForgeBuild, MinecraftBuild, Relation};
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{Build, Entity, Forge, ForgeRelease, Id, Minecraft, MinecraftRelease, now};
use crate::table;
use serde::Serialize;
use sqlx::SqlitePool;
use std::marker::PhantomData;
use tracing::instrument;

/// What a sync did to the stored release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A release type: keyed on its upstream `name`, with one mutable detail
/// column refreshed by syncs.
pub trait Release: Entity {
    /// Upstream record handed to [`Releases::sync`].
    type Record: std::fmt::Debug + Send + Sync;
    /// How builds point at this release.
    type Builds: Relation<Left = Self, Right = Build>;
    const DETAIL: &'static str;

    fn record_name(record: &Self::Record) -> &str;
    fn record_detail(record: &Self::Record) -> &str;
    fn detail(&self) -> &str;
}

impl Release for Minecraft {
    type Record = MinecraftRelease;
    type Builds = MinecraftBuild;
    const DETAIL: &'static str = "kind";

    fn record_name(record: &MinecraftRelease) -> &str {
        &record.name
    }
    fn record_detail(record: &MinecraftRelease) -> &str {
        &record.kind
    }
    fn detail(&self) -> &str {
        &self.kind
    }
}

impl Release for Forge {
    type Record = ForgeRelease;
    type Builds = ForgeBuild;
    const DETAIL: &'static str = "minecraft";

    fn record_name(record: &ForgeRelease) -> &str {
        &record.name
    }
    fn record_detail(record: &ForgeRelease) -> &str {
        &record.minecraft
    }
    fn detail(&self) -> &str {
        &self.minecraft
    }
}

pub type Minecrafts = Releases<Minecraft>;
pub type Forges = Releases<Forge>;

pub struct Releases<E: Release> {
    pool: SqlitePool,
    builds: AssociationTable<E::Builds>,
    release: PhantomData<fn() -> E>,
}
impl<E: Release> Clone for Releases<E> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), builds: self.builds.clone(), release: PhantomData }
    }
}
impl<E: Release> std::fmt::Debug for Releases<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Releases").field("table", &E::TABLE).finish()
    }
}

impl<E: Release> Releases<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self { builds: AssociationTable::new(pool.clone()), pool, release: PhantomData }
    }

    /// Builds referencing each release.
    pub fn builds(&self) -> &AssociationTable<E::Builds> {
        &self.builds
    }

    pub async fn list(&self) -> Result<Vec<E>> {
        table::list(&self.pool, None).await
    }

    /// Look a release up by id or upstream version string.
    pub async fn get(&self, key: &str) -> Result<E> {
        table::resolve(&self.pool, "name", key, None).await
    }

    pub async fn by_id(&self, id: Id) -> Result<E> {
        table::by_id(&self.pool, id).await
    }

    /// Create the release if it is unknown, otherwise refresh its detail.
    ///
    /// Syncing the same record twice leaves the row untouched the second
    /// time, `updated_at` included.
    #[instrument(skip(self), fields(table = E::TABLE))]
    pub async fn sync(&self, record: &E::Record) -> Result<(E, SyncOutcome)> {
        let name = E::record_name(record).trim();
        let detail = E::record_detail(record).trim();
        if name.is_empty() || detail.is_empty() {
            exn::bail!(ErrorKind::Validation(format!("{} records need a name and a {}", E::KIND, E::DETAIL)));
        }
        let (sql, outcome) = match table::find::<E>(&self.pool, "name", name, None).await? {
            Some(current) if current.detail() == detail => return Ok((current, SyncOutcome::Unchanged)),
            Some(_) => (
                format!(
                    "UPDATE {table} SET {detail} = ?2, updated_at = ?3 WHERE name = ?1 RETURNING *",
                    table = E::TABLE,
                    detail = E::DETAIL,
                ),
                SyncOutcome::Updated,
            ),
            None => (
                format!(
                    "INSERT INTO {table} (name, {detail}, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) RETURNING *",
                    table = E::TABLE,
                    detail = E::DETAIL,
                ),
                SyncOutcome::Created,
            ),
        };
        let row: E::Row = sqlx::query_as(&sql)
            .bind(name)
            .bind(detail)
            .bind(now())
            .fetch_one(&self.pool)
            .await
            .or_constraint(
                || ErrorKind::Conflict(format!("{} `{name}` was synced concurrently", E::KIND)),
                || ErrorKind::Database,
            )?;
        tracing::debug!(name, ?outcome, "synced release");
        Ok((E::try_from(row)?, outcome))
    }

    /// Refused while builds still reference the release.
    #[instrument(skip(self), fields(table = E::TABLE))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        table::delete::<E>(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::testing::{build, minecraft, pack, store};
    use rstest::rstest;

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let (_db, store, _) = store().await;
        let record = MinecraftRelease { name: "1.12.2".into(), kind: "release".into() };
        let (created, outcome) = store.minecrafts.sync(&record).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Created);
        let (again, outcome) = store.minecrafts.sync(&record).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(again, created);
        assert_eq!(store.minecrafts.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_updates_detail() {
        let (_db, store, _) = store().await;
        let record = ForgeRelease { name: "14.23.5.2847".into(), minecraft: "1.12".into() };
        let (created, _) = store.forges.sync(&record).await.unwrap();
        let record = ForgeRelease { minecraft: "1.12.2".into(), ..record };
        let (updated, outcome) = store.forges.sync(&record).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.minecraft, "1.12.2");
        assert_eq!(store.forges.get("14.23.5.2847").await.unwrap(), updated);
    }

    #[rstest]
    #[case("", "release")]
    #[case("1.12.2", " ")]
    #[tokio::test]
    async fn test_sync_validates(#[case] name: &str, #[case] kind: &str) {
        let (_db, store, _) = store().await;
        let record = MinecraftRelease { name: name.into(), kind: kind.into() };
        let err = store.minecrafts.sync(&record).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[test]
    fn test_mojang_manifest_entry() {
        let record: MinecraftRelease =
            serde_json::from_str(r#"{"id": "1.12.2", "type": "release", "url": "https://example.com"}"#).unwrap();
        assert_eq!(record, MinecraftRelease { name: "1.12.2".into(), kind: "release".into() });
    }

    #[tokio::test]
    async fn test_builds_of_release() {
        let (_db, store, _) = store().await;
        let mc = minecraft(&store, "1.12.2").await;
        let tech = pack(&store, "Tech").await;
        let b1 = build(&store, &tech, "b1", "1.12.2").await;

        assert_eq!(store.minecrafts.builds().list_by_a(mc.id).await.unwrap(), [b1.clone()]);
        let err = store.minecrafts.delete(mc.id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));

        store.minecrafts.builds().unlink(mc.id, b1.id).await.unwrap();
        store.minecrafts.delete(mc.id).await.unwrap();
        assert_eq!(store.builds.by_id(b1.id).await.unwrap().minecraft_id, None);
    }
}
