//! Users, teams and clients: just enough to take part in links.

use crate::association::{AssociationTable, TeamUser};
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{Id, Identity, IdentityKind, IdentityRow, Teams, now};
use crate::table;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::marker::PhantomData;
use tracing::instrument;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub struct Identities<K> {
    pool: SqlitePool,
    kind: PhantomData<fn() -> K>,
}
impl<K> Clone for Identities<K> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), kind: PhantomData }
    }
}
impl<K: IdentityKind> std::fmt::Debug for Identities<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identities").field("table", &K::TABLE).finish()
    }
}

impl<K: IdentityKind> Identities<K> {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, kind: PhantomData }
    }

    pub async fn list(&self) -> Result<Vec<Identity<K>>> {
        table::list(&self.pool, None).await
    }

    pub async fn get(&self, key: &str) -> Result<Identity<K>> {
        table::resolve(&self.pool, "slug", key, None).await
    }

    pub async fn by_id(&self, id: Id) -> Result<Identity<K>> {
        table::by_id(&self.pool, id).await
    }

    #[instrument(skip(self, input), fields(kind = K::KIND, name = ?input.name))]
    pub async fn create(&self, input: IdentityInput) -> Result<Identity<K>> {
        let name = table::required_name(K::KIND, input.name.as_deref())?;
        let slug = table::slug(&name, input.slug.as_deref())?;
        let timestamp = now();
        let sql = format!(
            "INSERT INTO {} (name, slug, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING *",
            K::TABLE
        );
        let row: IdentityRow = sqlx::query_as(&sql)
            .bind(&name)
            .bind(&slug)
            .bind(timestamp)
            .bind(timestamp)
            .fetch_one(&self.pool)
            .await
            .or_constraint(
                || ErrorKind::Conflict(format!("{} slug `{slug}` is already taken", K::KIND)),
                || ErrorKind::Database,
            )?;
        Identity::try_from(row)
    }

    /// Refused while the identity is still linked anywhere.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        table::delete::<Identity<K>>(&self.pool, id).await
    }
}

impl Identities<Teams> {
    /// Team membership.
    pub fn users(&self) -> AssociationTable<TeamUser> {
        AssociationTable::new(self.pool.clone())
    }
}
