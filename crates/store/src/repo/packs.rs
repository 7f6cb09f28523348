use super::{Upload, patch_text, put_upload};
use crate::association::{AssociationTable, PackClient, PackTeam, PackUser};
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{Attachment, Build, Entity, Id, Pack, PackRow, now};
use crate::table::{self, Scope};
use serde::Deserialize;
use solder_storage::{ArtifactStore, Category};
use sqlx::SqlitePool;
use tracing::instrument;

/// Fields accepted when creating or updating a pack.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub website: Option<String>,
    pub hidden: Option<bool>,
    /// Build id or slug; must belong to the pack.
    pub recommended: Option<String>,
    /// Build id or slug; must belong to the pack.
    pub latest: Option<String>,
    #[serde(skip)]
    pub logo: Option<Upload>,
}

#[derive(Debug, Clone)]
pub struct Packs {
    pool: SqlitePool,
    artifacts: ArtifactStore,
    clients: AssociationTable<PackClient>,
    users: AssociationTable<PackUser>,
    teams: AssociationTable<PackTeam>,
}
impl Packs {
    pub fn new(pool: SqlitePool, artifacts: ArtifactStore) -> Self {
        Self {
            clients: AssociationTable::new(pool.clone()),
            users: AssociationTable::new(pool.clone()),
            teams: AssociationTable::new(pool.clone()),
            pool,
            artifacts,
        }
    }

    pub fn clients(&self) -> &AssociationTable<PackClient> {
        &self.clients
    }

    pub fn users(&self) -> &AssociationTable<PackUser> {
        &self.users
    }

    pub fn teams(&self) -> &AssociationTable<PackTeam> {
        &self.teams
    }

    pub async fn list(&self) -> Result<Vec<Pack>> {
        table::list(&self.pool, None).await
    }

    /// Look a pack up by id or slug.
    pub async fn get(&self, key: &str) -> Result<Pack> {
        table::resolve(&self.pool, "slug", key, None).await
    }

    pub async fn by_id(&self, id: Id) -> Result<Pack> {
        table::by_id(&self.pool, id).await
    }

    /// Read the pack's logo back from the artifact store.
    pub async fn logo(&self, pack: &Pack) -> Result<(Vec<u8>, Attachment)> {
        let Some(logo) = &pack.logo else {
            exn::bail!(ErrorKind::NotFound(format!("logo of pack `{}`", pack.slug)));
        };
        let content = self.artifacts.get(Category::Logo, &logo.md5).await.map_err(ErrorKind::storage)?;
        Ok((content, logo.clone()))
    }

    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(&self, input: PackInput) -> Result<Pack> {
        let name = table::required_name(Pack::KIND, input.name.as_deref())?;
        let slug = table::slug(&name, input.slug.as_deref())?;
        if [&input.recommended, &input.latest].into_iter().flatten().any(|key| !key.trim().is_empty()) {
            exn::bail!(ErrorKind::Validation("a new pack has no builds to point at".to_string()));
        }
        let logo = put_upload(&self.artifacts, Category::Logo, input.logo.as_ref()).await?.map(Attachment::from);
        let timestamp = now();
        let row: PackRow = sqlx::query_as(
            "INSERT INTO packs (name, slug, website, hidden, logo_md5, logo_content_type, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.website, None))
        .bind(input.hidden.unwrap_or(false))
        .bind(logo.as_ref().map(|logo| logo.md5.as_str()))
        .bind(logo.as_ref().map(|logo| logo.content_type.as_str()))
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        tracing::info!(%slug, "created pack");
        Pack::try_from(row)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Id, input: PackInput) -> Result<Pack> {
        let current = self.by_id(id).await?;
        let name = match input.name.as_deref() {
            Some(name) => table::required_name(Pack::KIND, Some(name))?,
            None => current.name,
        };
        let slug = match input.slug.as_deref() {
            Some(slug) => table::slug(&name, Some(slug))?,
            None => current.slug,
        };
        let recommended = self.pointer(id, input.recommended, current.recommended_id).await?;
        let latest = self.pointer(id, input.latest, current.latest_id).await?;
        let logo = match put_upload(&self.artifacts, Category::Logo, input.logo.as_ref()).await? {
            Some(artifact) => Some(Attachment::from(artifact)),
            None => current.logo,
        };
        let row: PackRow = sqlx::query_as(
            "UPDATE packs SET name = ?, slug = ?, website = ?, hidden = ?, logo_md5 = ?, logo_content_type = ?, \
             recommended_id = ?, latest_id = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.website, current.website))
        .bind(input.hidden.unwrap_or(current.hidden))
        .bind(logo.as_ref().map(|logo| logo.md5.as_str()))
        .bind(logo.as_ref().map(|logo| logo.content_type.as_str()))
        .bind(recommended)
        .bind(latest)
        .bind(now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        Pack::try_from(row)
    }

    /// Refused while the pack still has builds or links.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        table::delete::<Pack>(&self.pool, id).await
    }

    /// Resolve a recommended/latest pointer to a build of this pack.
    async fn pointer(&self, pack: Id, key: Option<String>, current: Option<Id>) -> Result<Option<Id>> {
        let Some(key) = key.map(|key| key.trim().to_string()) else {
            return Ok(current);
        };
        if key.is_empty() {
            return Ok(None);
        }
        let scope = Scope { column: "pack_id", id: pack };
        match table::find::<Build>(&self.pool, "slug", &key, Some(scope)).await? {
            Some(build) => Ok(Some(build.id)),
            None => exn::bail!(ErrorKind::Validation(format!("build `{key}` does not belong to this pack"))),
        }
    }
}

fn slug_taken(slug: &str) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Conflict(format!("slug `{slug}` is already taken"))
}
