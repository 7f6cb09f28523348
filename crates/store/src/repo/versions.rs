use super::{Upload, put_upload};
use crate::association::{AssociationTable, BuildVersion};
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{Attachment, Entity, Id, Version, VersionRow, now};
use crate::table::{self, Scope};
use serde::Deserialize;
use solder_storage::{ArtifactStore, Category};
use sqlx::SqlitePool;
use tracing::instrument;

/// Fields accepted when creating or updating a version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(skip)]
    pub file: Option<Upload>,
}

/// Versions, always addressed within their mod.
#[derive(Debug, Clone)]
pub struct Versions {
    pool: SqlitePool,
    artifacts: ArtifactStore,
    builds: AssociationTable<BuildVersion>,
}
impl Versions {
    pub fn new(pool: SqlitePool, artifacts: ArtifactStore) -> Self {
        Self { builds: AssociationTable::new(pool.clone()), pool, artifacts }
    }

    /// Builds shipping each version, through [`list_by_b`](AssociationTable::list_by_b).
    pub fn builds(&self) -> &AssociationTable<BuildVersion> {
        &self.builds
    }

    fn scope(r#mod: Id) -> Option<Scope> {
        Some(Scope { column: "mod_id", id: r#mod })
    }

    pub async fn list(&self, r#mod: Id) -> Result<Vec<Version>> {
        table::list(&self.pool, Self::scope(r#mod)).await
    }

    /// Look a version up by id or slug within its mod.
    pub async fn get(&self, r#mod: Id, key: &str) -> Result<Version> {
        table::resolve(&self.pool, "slug", key, Self::scope(r#mod)).await
    }

    pub async fn by_id(&self, id: Id) -> Result<Version> {
        table::by_id(&self.pool, id).await
    }

    /// Read the version's file back from the artifact store.
    pub async fn file(&self, version: &Version) -> Result<(Vec<u8>, Attachment)> {
        let Some(file) = &version.file else {
            exn::bail!(ErrorKind::NotFound(format!("file of version `{}`", version.slug)));
        };
        let content = self.artifacts.get(Category::File, &file.md5).await.map_err(ErrorKind::storage)?;
        Ok((content, file.clone()))
    }

    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(&self, r#mod: Id, input: VersionInput) -> Result<Version> {
        let name = table::required_name(Version::KIND, input.name.as_deref())?;
        let slug = table::slug(&name, input.slug.as_deref())?;
        let file = put_upload(&self.artifacts, Category::File, input.file.as_ref()).await?.map(Attachment::from);
        let timestamp = now();
        let row: VersionRow = sqlx::query_as(
            "INSERT INTO versions (mod_id, name, slug, file_md5, file_content_type, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(r#mod)
        .bind(&name)
        .bind(&slug)
        .bind(file.as_ref().map(|file| file.md5.as_str()))
        .bind(file.as_ref().map(|file| file.content_type.as_str()))
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::NotFound(format!("mod {}", r#mod)))?;
        tracing::info!(%slug, md5 = ?file.as_ref().map(|file| file.md5.as_str()), "created version");
        Version::try_from(row)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Id, input: VersionInput) -> Result<Version> {
        let current = self.by_id(id).await?;
        let name = match input.name.as_deref() {
            Some(name) => table::required_name(Version::KIND, Some(name))?,
            None => current.name,
        };
        let slug = match input.slug.as_deref() {
            Some(slug) => table::slug(&name, Some(slug))?,
            None => current.slug,
        };
        let file = match put_upload(&self.artifacts, Category::File, input.file.as_ref()).await? {
            Some(artifact) => Some(Attachment::from(artifact)),
            None => current.file,
        };
        let row: VersionRow = sqlx::query_as(
            "UPDATE versions SET name = ?, slug = ?, file_md5 = ?, file_content_type = ?, updated_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(file.as_ref().map(|file| file.md5.as_str()))
        .bind(file.as_ref().map(|file| file.content_type.as_str()))
        .bind(now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        Version::try_from(row)
    }

    /// Refused while the version is still part of a build.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        table::delete::<Version>(&self.pool, id).await
    }
}

fn slug_taken(slug: &str) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Conflict(format!("version slug `{slug}` is already taken for this mod"))
}
