use super::patch_text;
use crate::association::{AssociationTable, ModTeam, ModUser};
use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{Entity, Id, Mod, ModRow, now};
use crate::table;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::instrument;

/// Fields accepted when creating or updating a mod.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Mods {
    pool: SqlitePool,
    users: AssociationTable<ModUser>,
    teams: AssociationTable<ModTeam>,
}
impl Mods {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: AssociationTable::new(pool.clone()),
            teams: AssociationTable::new(pool.clone()),
            pool,
        }
    }

    pub fn users(&self) -> &AssociationTable<ModUser> {
        &self.users
    }

    pub fn teams(&self) -> &AssociationTable<ModTeam> {
        &self.teams
    }

    pub async fn list(&self) -> Result<Vec<Mod>> {
        table::list(&self.pool, None).await
    }

    pub async fn get(&self, key: &str) -> Result<Mod> {
        table::resolve(&self.pool, "slug", key, None).await
    }

    pub async fn by_id(&self, id: Id) -> Result<Mod> {
        table::by_id(&self.pool, id).await
    }

    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(&self, input: ModInput) -> Result<Mod> {
        let name = table::required_name(Mod::KIND, input.name.as_deref())?;
        let slug = table::slug(&name, input.slug.as_deref())?;
        let timestamp = now();
        let row: ModRow = sqlx::query_as(
            "INSERT INTO mods (name, slug, description, author, website, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.description, None))
        .bind(patch_text(input.author, None))
        .bind(patch_text(input.website, None))
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        tracing::info!(%slug, "created mod");
        Mod::try_from(row)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Id, input: ModInput) -> Result<Mod> {
        let current = self.by_id(id).await?;
        let name = match input.name.as_deref() {
            Some(name) => table::required_name(Mod::KIND, Some(name))?,
            None => current.name,
        };
        let slug = match input.slug.as_deref() {
            Some(slug) => table::slug(&name, Some(slug))?,
            None => current.slug,
        };
        let row: ModRow = sqlx::query_as(
            "UPDATE mods SET name = ?, slug = ?, description = ?, author = ?, website = ?, updated_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(patch_text(input.description, current.description))
        .bind(patch_text(input.author, current.author))
        .bind(patch_text(input.website, current.website))
        .bind(now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_constraint(slug_taken(&slug), || ErrorKind::Database)?;
        Mod::try_from(row)
    }

    /// Refused while the mod has versions or user/team links.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> Result<()> {
        table::delete::<Mod>(&self.pool, id).await
    }
}

fn slug_taken(slug: &str) -> impl FnOnce() -> ErrorKind + '_ {
    move || ErrorKind::Conflict(format!("mod slug `{slug}` is already taken"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::IdentityInput;
    use crate::repo::testing::{r#mod, store, version};

    #[tokio::test]
    async fn test_create_and_patch() {
        let (_db, store, _) = store().await;
        let input = ModInput {
            name: Some("Just Enough Items".into()),
            slug: Some("jei".into()),
            author: Some("mezz".into()),
            ..Default::default()
        };
        let jei = store.mods.create(input).await.unwrap();
        assert_eq!(jei.slug, "jei");
        assert_eq!(jei.author.as_deref(), Some("mezz"));

        let patch = ModInput { author: Some(String::new()), description: Some("Item viewer".into()), ..Default::default() };
        let updated = store.mods.update(jei.id, patch).await.unwrap();
        assert_eq!(updated.author, None);
        assert_eq!(updated.description.as_deref(), Some("Item viewer"));
        assert_eq!(updated.name, "Just Enough Items");
    }

    #[tokio::test]
    async fn test_user_and_team_links() {
        let (_db, store, _) = store().await;
        let jei = r#mod(&store, "jei").await;
        let mezz = store.users.create(IdentityInput { name: Some("mezz".into()), slug: None }).await.unwrap();
        let team = store.teams.create(IdentityInput { name: Some("Maintainers".into()), slug: None }).await.unwrap();

        store.mods.users().link(jei.id, mezz.id, Some("owner")).await.unwrap();
        store.mods.teams().link(jei.id, team.id, None).await.unwrap();

        let users = store.mods.users().links_by_a(jei.id).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].entity, mezz);
        assert_eq!(users[0].perm.as_deref(), Some("owner"));
        assert_eq!(store.mods.teams().list_by_b(team.id).await.unwrap(), [jei.clone()]);

        let err = store.mods.delete(jei.id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_with_versions() {
        let (_db, store, _) = store().await;
        let jei = r#mod(&store, "jei").await;
        let v47 = version(&store, &jei, "4.7", None).await;
        let err = store.mods.delete(jei.id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        store.versions.delete(v47.id).await.unwrap();
        store.mods.delete(jei.id).await.unwrap();
        assert!(store.mods.list().await.unwrap().is_empty());
    }
}
