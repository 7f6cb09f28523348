use super::patch_text;
use crate::association::{AssociationTable, BuildVersion};
use crate::error::{ErrorKind, Result, SqlxResultExt, still_referenced};
use crate::models::{Build, BuildRow, Entity, Forge, Id, Minecraft, now};
use crate::table::{self, Scope};
use exn::ResultExt;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::instrument;

/// Fields accepted when creating or updating a build.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Minecraft release id or version string. Required on create.
    pub minecraft: Option<String>,
    /// Forge release id or version string; blank removes it.
    pub forge: Option<String>,
    pub min_java: Option<String>,
    pub min_memory: Option<String>,
    pub published: Option<bool>,
}

/// Builds, always addressed within their pack.
#[derive(Debug, Clone)]
pub struct Builds {
    pool: SqlitePool,
    versions: AssociationTable<BuildVersion>,
}
impl Builds {
    pub fn new(pool: SqlitePool) -> Self {
        Self { versions: AssociationTable::new(pool.clone()), pool }
    }

    /// Mod versions shipped in each build.
    pub fn versions(&self) -> &AssociationTable<BuildVersion> {
        &self.versions
    }

    fn scope(pack: Id) -> Option<Scope> {
        Some(Scope { column: "pack_id", id: pack })
    }

    pub async fn list(&self, pack: Id) -> Result<Vec<Build>> {
        table::list(&self.pool, Self::scope(pack)).await
    }

    /// Look a build up by id or slug. Builds of other packs never match.
    pub async fn get(&self, pack: Id, key: &str) -> Result<Build> {
        table::resolve(&self.pool, "slug", key, Self::scope(pack)).await
    }

    pub async fn by_id(&self, id: Id) -> Result<Build> {
        table::by_id(&self.pool, id).await
    }

    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(&self, pack: Id, input: BuildInput) -> Result<Build> {
        let name = table::required_name(Build::KIND, input.name.as_deref())?;
        let slug = table::slug(&name, input.slug.as_deref())?;
        let minecraft = match input.minecraft.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => self.release::<Minecraft>(key).await?,
            _ => exn::bail!(ErrorKind::Validation("a build needs a minecraft release".to_string())),
        };
        let forge = self.forge(input.forge.as_deref(), None).await?;
        let timestamp = now();
        let row: BuildRow = sqlx::query_as(
            "INSERT INTO builds (pack_id, minecraft_id, forge_id, name, slug, min_java, min_memory, published, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(pack)
        .bind(minecraft)
        .bind(forge)
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.min_java, None))
        .bind(patch_text(input.min_memory, None))
        .bind(input.published.unwrap_or(true))
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::NotFound(format!("pack {pack}")))?;
        tracing::info!(%slug, "created build");
        Build::try_from(row)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Id, input: BuildInput) -> Result<Build> {
        let current = self.by_id(id).await?;
        let name = match input.name.as_deref() {
            Some(name) => table::required_name(Build::KIND, Some(name))?,
            None => current.name,
        };
        let slug = match input.slug.as_deref() {
            Some(slug) => table::slug(&name, Some(slug))?,
            None => current.slug,
        };
        let minecraft = match input.minecraft.as_deref().map(str::trim) {
            None => current.minecraft_id,
            Some("") => exn::bail!(ErrorKind::Validation("a build needs a minecraft release".to_string())),
            Some(key) => Some(self.release::<Minecraft>(key).await?),
        };
        let forge = self.forge(input.forge.as_deref(), current.forge_id).await?;
        let row: BuildRow = sqlx::query_as(
            "UPDATE builds SET minecraft_id = ?, forge_id = ?, name = ?, slug = ?, min_java = ?, min_memory = ?, \
             published = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(minecraft)
        .bind(forge)
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.min_java, current.min_java))
        .bind(patch_text(input.min_memory, current.min_memory))
        .bind(input.published.unwrap_or(current.published))
        .bind(now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        Build::try_from(row)
    }

    /// Delete a build, clearing the pack's recommended/latest pointers to it.
    ///
    /// Refused while versions are still linked.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(
            "UPDATE packs SET \
             recommended_id = CASE WHEN recommended_id = ?1 THEN NULL ELSE recommended_id END, \
             latest_id = CASE WHEN latest_id = ?1 THEN NULL ELSE latest_id END \
             WHERE recommended_id = ?1 OR latest_id = ?1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .or_raise(|| ErrorKind::Database)?;
        let result = sqlx::query("DELETE FROM builds WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_constraint(|| ErrorKind::Database, still_referenced(Build::KIND))?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("{} {id}", Build::KIND)));
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Resolve a release reference given by id or upstream version string.
    async fn release<E: Entity>(&self, key: &str) -> Result<Id> {
        match table::find::<E>(&self.pool, "name", key, None).await? {
            Some(release) => Ok(release.id()),
            None => exn::bail!(ErrorKind::Validation(format!("unknown {} `{key}`", E::KIND))),
        }
    }

    async fn forge(&self, key: Option<&str>, current: Option<Id>) -> Result<Option<Id>> {
        match key.map(str::trim) {
            None => Ok(current),
            Some("") => Ok(None),
            Some(key) => Ok(Some(self.release::<Forge>(key).await?)),
        }
    }
}

fn slug_taken(slug: &str) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Conflict(format!("build slug `{slug}` is already taken in this pack"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForgeRelease;
    use crate::repo::PackInput;
    use crate::repo::testing::{build, minecraft, pack, store, r#mod, version};

    #[tokio::test]
    async fn test_create_resolves_releases() {
        let (_db, store, _) = store().await;
        let mc = minecraft(&store, "1.12.2").await;
        let forge = ForgeRelease { name: "14.23.5.2847".into(), minecraft: "1.12.2".into() };
        let (forge, _) = store.forges.sync(&forge).await.unwrap();
        let tech = pack(&store, "Tech").await;

        let input = BuildInput {
            name: Some("1.0.0".into()),
            minecraft: Some(mc.id.to_string()),
            forge: Some("14.23.5.2847".into()),
            min_memory: Some("2048".into()),
            ..Default::default()
        };
        let created = store.builds.create(tech.id, input).await.unwrap();
        assert_eq!(created.slug, "1-0-0");
        assert_eq!(created.minecraft_id, Some(mc.id));
        assert_eq!(created.forge_id, Some(forge.id));
        assert_eq!(created.min_memory.as_deref(), Some("2048"));
        assert!(created.published);

        let patch = BuildInput { forge: Some(String::new()), published: Some(false), ..Default::default() };
        let updated = store.builds.update(created.id, patch).await.unwrap();
        assert_eq!(updated.forge_id, None);
        assert!(!updated.published);
        assert_eq!(updated.minecraft_id, Some(mc.id));
    }

    #[tokio::test]
    async fn test_create_requires_known_minecraft() {
        let (_db, store, _) = store().await;
        let tech = pack(&store, "Tech").await;
        for minecraft in [None, Some("1.12.2")] {
            let input = BuildInput { name: Some("b1".into()), minecraft: minecraft.map(String::from), ..Default::default() };
            let err = store.builds.create(tech.id, input).await.unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_builds_are_scoped_by_pack() {
        let (_db, store, _) = store().await;
        minecraft(&store, "1.12.2").await;
        let tech = pack(&store, "Tech").await;
        let other = pack(&store, "Other").await;
        let b1 = build(&store, &tech, "b1", "1.12.2").await;
        let other_b1 = build(&store, &other, "b1", "1.12.2").await;
        build(&store, &tech, "a0", "1.12.2").await;

        assert_eq!(store.builds.get(tech.id, "b1").await.unwrap(), b1);
        assert_eq!(store.builds.get(other.id, "b1").await.unwrap(), other_b1);
        let err = store.builds.get(other.id, &b1.id.to_string()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));

        let names: Vec<_> = store.builds.list(tech.id).await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["a0", "b1"]);

        let input = BuildInput { name: Some("b1".into()), minecraft: Some("1.12.2".into()), ..Default::default() };
        let err = store.builds.create(tech.id, input).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_clears_pack_pointers() {
        let (_db, store, _) = store().await;
        minecraft(&store, "1.12.2").await;
        let tech = pack(&store, "Tech").await;
        let b1 = build(&store, &tech, "b1", "1.12.2").await;
        let b2 = build(&store, &tech, "b2", "1.12.2").await;
        let patch = PackInput { recommended: Some("b1".into()), latest: Some("b2".into()), ..Default::default() };
        store.packs.update(tech.id, patch).await.unwrap();

        store.builds.delete(b1.id).await.unwrap();
        let tech = store.packs.by_id(tech.id).await.unwrap();
        assert_eq!(tech.recommended_id, None);
        assert_eq!(tech.latest_id, Some(b2.id));
    }

    #[tokio::test]
    async fn test_delete_refused_while_versions_linked() {
        let (_db, store, _) = store().await;
        minecraft(&store, "1.12.2").await;
        let tech = pack(&store, "Tech").await;
        let b1 = build(&store, &tech, "b1", "1.12.2").await;
        let jei = r#mod(&store, "jei").await;
        let v47 = version(&store, &jei, "4.7", None).await;
        store.builds.versions().link(b1.id, v47.id, None).await.unwrap();

        let patch = PackInput { latest: Some("b1".into()), ..Default::default() };
        store.packs.update(tech.id, patch).await.unwrap();
        let err = store.builds.delete(b1.id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        // The pointer update was rolled back with the refused delete.
        assert_eq!(store.packs.by_id(tech.id).await.unwrap().latest_id, Some(b1.id));

        store.builds.versions().unlink(b1.id, v47.id).await.unwrap();
        store.builds.delete(b1.id).await.unwrap();
        let err = store.builds.delete(b1.id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
