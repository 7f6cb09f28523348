//! Generic many-to-many (and many-to-one) link engine.
//!
//! Every relation in the system shares one protocol:
//!
//! | operation        | outcome when the pair is ... linked | ... not linked           |
//! |------------------|-------------------------------------|--------------------------|
//! | `link(a, b)`     | `Conflict("already linked")`        | link created             |
//! | `unlink(a, b)`   | link removed                        | `NotFound("not linked")` |
//!
//! The existence check and the mutation are one SQL statement, so the
//! database's key on the pair decides between two concurrent requests.
//!
//! A relation is declared once as a zero-sized type implementing
//! [`Relation`], and [`AssociationTable<R>`] provides the operations.

use crate::error::{ErrorKind, Result, SqlxResultExt};
use crate::models::{
    Build, Client, Entity, Forge, Id, Minecraft, Mod, Pack, Team, User, Version, now,
};
use exn::ResultExt;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use std::marker::PhantomData;
use tracing::instrument;

/// Where the links of a relation are stored.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Dedicated link table keyed on `(left, right)`.
    Table {
        table: &'static str,
        left: &'static str,
        right: &'static str,
    },
    /// Nullable column on the right-hand row pointing at its single left-hand
    /// entity (each build has at most one Minecraft release).
    Column { column: &'static str },
}

/// A relation between two entity kinds.
pub trait Relation: Send + Sync + 'static {
    type Left: Entity;
    type Right: Entity;
    const SHAPE: Shape;
    /// Whether links carry a permission string.
    const ROLE: bool = false;
}

macro_rules! relation {
    ($(#[$meta:meta])* $name:ident: $left:ty => $right:ty, $shape:expr $(, role = $role:expr)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;
        impl Relation for $name {
            type Left = $left;
            type Right = $right;
            const SHAPE: Shape = $shape;
            $(const ROLE: bool = $role;)?
        }
    };
}

relation!(PackClient: Pack => Client, Shape::Table { table: "client_packs", left: "pack_id", right: "client_id" });
relation!(PackUser: Pack => User, Shape::Table { table: "user_packs", left: "pack_id", right: "user_id" }, role = true);
relation!(PackTeam: Pack => Team, Shape::Table { table: "team_packs", left: "pack_id", right: "team_id" }, role = true);
relation!(ModUser: Mod => User, Shape::Table { table: "user_mods", left: "mod_id", right: "user_id" }, role = true);
relation!(ModTeam: Mod => Team, Shape::Table { table: "team_mods", left: "mod_id", right: "team_id" }, role = true);
relation!(TeamUser: Team => User, Shape::Table { table: "team_users", left: "team_id", right: "user_id" }, role = true);
relation!(
    /// Mod versions shipped in a build.
    BuildVersion: Build => Version,
    Shape::Table { table: "build_versions", left: "build_id", right: "version_id" }
);
relation!(MinecraftBuild: Minecraft => Build, Shape::Column { column: "minecraft_id" });
relation!(ForgeBuild: Forge => Build, Shape::Column { column: "forge_id" });

/// An entity reached through a link, with the link's permission string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link<E> {
    #[serde(flatten)]
    pub entity: E,
    pub perm: Option<String>,
}

struct LinkRow<T> {
    row: T,
    perm: Option<String>,
}
impl<'r, T: FromRow<'r, SqliteRow>> FromRow<'r, SqliteRow> for LinkRow<T> {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self { row: T::from_row(row)?, perm: row.try_get("link_perm")? })
    }
}

/// Link operations for one relation.
pub struct AssociationTable<R> {
    pool: SqlitePool,
    relation: PhantomData<fn() -> R>,
}
impl<R> Clone for AssociationTable<R> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), relation: PhantomData }
    }
}
impl<R> std::fmt::Debug for AssociationTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationTable").field("relation", &std::any::type_name::<R>()).finish()
    }
}

impl<R: Relation> AssociationTable<R> {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, relation: PhantomData }
    }

    fn perm_column() -> &'static str {
        match R::ROLE {
            true => "l.perm",
            false => "NULL",
        }
    }

    fn missing_entity() -> ErrorKind {
        ErrorKind::NotFound(format!("{} or {} does not exist", R::Left::KIND, R::Right::KIND))
    }

    /// True iff exactly this pair is linked.
    pub async fn exists(&self, a: Id, b: Id) -> Result<bool> {
        let sql = match R::SHAPE {
            Shape::Table { table, left, right } => {
                format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {left} = ? AND {right} = ?)")
            },
            Shape::Column { column } => {
                format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {column} = ? AND id = ?)", R::Right::TABLE)
            },
        };
        sqlx::query_scalar(&sql).bind(a).bind(b).fetch_one(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    /// Create the link, optionally carrying a permission string.
    ///
    /// For column-backed relations this points the right-hand row at `a`,
    /// replacing whatever it pointed at before.
    #[instrument(skip(self), fields(relation = std::any::type_name::<R>()))]
    pub async fn link(&self, a: Id, b: Id, perm: Option<&str>) -> Result<()> {
        if perm.is_some() && !R::ROLE {
            exn::bail!(ErrorKind::Validation(format!(
                "{} links to a {} carry no permission",
                R::Left::KIND,
                R::Right::KIND
            )));
        }
        let inserted = match R::SHAPE {
            Shape::Table { table, left, right } => {
                let (columns, values) = match R::ROLE {
                    true => (format!("{left}, {right}, perm, created_at"), "?, ?, ?, ?"),
                    false => (format!("{left}, {right}, created_at"), "?, ?, ?"),
                };
                let sql = format!("INSERT INTO {table} ({columns}) VALUES ({values}) ON CONFLICT DO NOTHING");
                let mut query = sqlx::query(&sql).bind(a).bind(b);
                if R::ROLE {
                    query = query.bind(perm);
                }
                query
                    .bind(now())
                    .execute(&self.pool)
                    .await
                    .or_constraint(|| ErrorKind::Conflict("already linked".to_string()), Self::missing_entity)?
                    .rows_affected()
            },
            Shape::Column { column } => {
                let sql = format!(
                    "UPDATE {table} SET {column} = ?1, updated_at = ?2 \
                     WHERE id = ?3 AND ({column} IS NULL OR {column} <> ?1)",
                    table = R::Right::TABLE,
                );
                let affected = sqlx::query(&sql)
                    .bind(a)
                    .bind(now())
                    .bind(b)
                    .execute(&self.pool)
                    .await
                    .or_constraint(|| ErrorKind::Database, Self::missing_entity)?
                    .rows_affected();
                if affected == 0 && !self.exists(a, b).await? {
                    exn::bail!(ErrorKind::NotFound(format!("{} {b}", R::Right::KIND)));
                }
                affected
            },
        };
        if inserted == 0 {
            exn::bail!(ErrorKind::Conflict("already linked".to_string()));
        }
        tracing::debug!("linked");
        Ok(())
    }

    /// Remove the link.
    #[instrument(skip(self), fields(relation = std::any::type_name::<R>()))]
    pub async fn unlink(&self, a: Id, b: Id) -> Result<()> {
        let result = match R::SHAPE {
            Shape::Table { table, left, right } => {
                let sql = format!("DELETE FROM {table} WHERE {left} = ? AND {right} = ?");
                sqlx::query(&sql).bind(a).bind(b).execute(&self.pool).await
            },
            Shape::Column { column } => {
                let sql = format!(
                    "UPDATE {} SET {column} = NULL, updated_at = ? WHERE id = ? AND {column} = ?",
                    R::Right::TABLE
                );
                sqlx::query(&sql).bind(now()).bind(b).bind(a).execute(&self.pool).await
            },
        };
        if result.or_raise(|| ErrorKind::Database)?.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound("not linked".to_string()));
        }
        tracing::debug!("unlinked");
        Ok(())
    }

    /// Right-hand entities linked to `a`, by name.
    pub async fn list_by_a(&self, a: Id) -> Result<Vec<R::Right>> {
        Ok(self.links_by_a(a).await?.into_iter().map(|link| link.entity).collect())
    }

    /// Left-hand entities linked to `b`, by name.
    pub async fn list_by_b(&self, b: Id) -> Result<Vec<R::Left>> {
        Ok(self.links_by_b(b).await?.into_iter().map(|link| link.entity).collect())
    }

    /// [`list_by_a`](Self::list_by_a) with each link's permission.
    pub async fn links_by_a(&self, a: Id) -> Result<Vec<Link<R::Right>>> {
        let target = R::Right::TABLE;
        let sql = match R::SHAPE {
            Shape::Table { table, left, right } => format!(
                "SELECT e.*, {perm} AS link_perm FROM {target} e JOIN {table} l ON l.{right} = e.id \
                 WHERE l.{left} = ? ORDER BY e.name ASC, e.id ASC",
                perm = Self::perm_column(),
            ),
            Shape::Column { column } => format!(
                "SELECT e.*, NULL AS link_perm FROM {target} e WHERE e.{column} = ? ORDER BY e.name ASC, e.id ASC"
            ),
        };
        self.fetch_links::<R::Right>(&sql, a).await
    }

    /// [`list_by_b`](Self::list_by_b) with each link's permission.
    pub async fn links_by_b(&self, b: Id) -> Result<Vec<Link<R::Left>>> {
        let target = R::Left::TABLE;
        let sql = match R::SHAPE {
            Shape::Table { table, left, right } => format!(
                "SELECT e.*, {perm} AS link_perm FROM {target} e JOIN {table} l ON l.{left} = e.id \
                 WHERE l.{right} = ? ORDER BY e.name ASC, e.id ASC",
                perm = Self::perm_column(),
            ),
            Shape::Column { column } => format!(
                "SELECT e.*, NULL AS link_perm FROM {target} e JOIN {owner} r ON r.{column} = e.id \
                 WHERE r.id = ? ORDER BY e.name ASC, e.id ASC",
                owner = R::Right::TABLE,
            ),
        };
        self.fetch_links::<R::Left>(&sql, b).await
    }

    async fn fetch_links<E: Entity>(&self, sql: &str, id: Id) -> Result<Vec<Link<E>>> {
        let rows: Vec<LinkRow<E::Row>> =
            sqlx::query_as(sql).bind(id).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|LinkRow { row, perm }| Ok(Link { entity: E::try_from(row)?, perm }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::models::Id;

    async fn insert(db: &Database, sql: &str) -> Id {
        sqlx::query(sql).execute(db.pool()).await.unwrap().last_insert_rowid()
    }

    async fn fixtures() -> (Database, Id, Id, Id) {
        let db = Database::connect_in_memory().await.unwrap();
        let pack = insert(&db, "INSERT INTO packs (name, slug, created_at, updated_at) VALUES ('Tech', 'tech', 0, 0)").await;
        let zed = insert(&db, "INSERT INTO users (name, slug, created_at, updated_at) VALUES ('zed', 'zed', 0, 0)").await;
        let amy = insert(&db, "INSERT INTO users (name, slug, created_at, updated_at) VALUES ('amy', 'amy', 0, 0)").await;
        (db, pack, zed, amy)
    }

    #[tokio::test]
    async fn test_link_twice_conflicts() {
        let (db, pack, zed, _) = fixtures().await;
        let users = AssociationTable::<PackUser>::new(db.pool().clone());
        users.link(pack, zed, Some("admin")).await.unwrap();
        let err = users.link(pack, zed, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        assert_eq!(users.list_by_a(pack).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unlink_twice_not_found() {
        let (db, pack, zed, _) = fixtures().await;
        let users = AssociationTable::<PackUser>::new(db.pool().clone());
        users.link(pack, zed, None).await.unwrap();
        users.unlink(pack, zed).await.unwrap();
        let err = users.unlink(pack, zed).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(message) if message == "not linked"));
        assert!(!users.exists(pack, zed).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_tracks_history() {
        let (db, pack, zed, amy) = fixtures().await;
        let users = AssociationTable::<PackUser>::new(db.pool().clone());
        assert!(!users.exists(pack, zed).await.unwrap());
        users.link(pack, zed, None).await.unwrap();
        users.link(pack, amy, None).await.unwrap();
        users.unlink(pack, zed).await.unwrap();
        assert!(!users.exists(pack, zed).await.unwrap());
        assert!(users.exists(pack, amy).await.unwrap());
    }

    #[tokio::test]
    async fn test_lists_are_name_ordered_with_perm() {
        let (db, pack, zed, amy) = fixtures().await;
        let users = AssociationTable::<PackUser>::new(db.pool().clone());
        users.link(pack, zed, Some("owner")).await.unwrap();
        users.link(pack, amy, None).await.unwrap();
        let links = users.links_by_a(pack).await.unwrap();
        let names: Vec<_> = links.iter().map(|l| l.entity.name.as_str()).collect();
        assert_eq!(names, ["amy", "zed"]);
        assert_eq!(links[0].perm, None);
        assert_eq!(links[1].perm.as_deref(), Some("owner"));
        let packs = users.list_by_b(zed).await.unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].slug, "tech");
    }

    #[tokio::test]
    async fn test_perm_rejected_on_plain_relation() {
        let db = Database::connect_in_memory().await.unwrap();
        let clients = AssociationTable::<PackClient>::new(db.pool().clone());
        let err = clients.link(1, 1, Some("admin")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[tokio::test]
    async fn test_link_to_missing_entity() {
        let (db, pack, _, _) = fixtures().await;
        let users = AssociationTable::<PackUser>::new(db.pool().clone());
        let err = users.link(pack, 999, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_column_relation() {
        let (db, pack, _, _) = fixtures().await;
        let old = insert(&db, "INSERT INTO minecrafts (name, kind, created_at, updated_at) VALUES ('1.7.10', 'release', 0, 0)").await;
        let new = insert(&db, "INSERT INTO minecrafts (name, kind, created_at, updated_at) VALUES ('1.12.2', 'release', 0, 0)").await;
        let build = insert(
            &db,
            &format!(
                "INSERT INTO builds (pack_id, minecraft_id, name, slug, created_at, updated_at) \
                 VALUES ({pack}, {old}, 'b1', 'b1', 0, 0)"
            ),
        )
        .await;
        let table = AssociationTable::<MinecraftBuild>::new(db.pool().clone());
        assert!(table.exists(old, build).await.unwrap());
        let err = table.link(old, build, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));

        table.link(new, build, None).await.unwrap();
        assert!(!table.exists(old, build).await.unwrap());
        assert_eq!(table.list_by_b(build).await.unwrap()[0].name, "1.12.2");
        assert_eq!(table.list_by_a(new).await.unwrap()[0].id, build);
        assert!(table.list_by_a(old).await.unwrap().is_empty());

        let err = table.unlink(old, build).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        table.unlink(new, build).await.unwrap();
        assert!(table.list_by_b(build).await.unwrap().is_empty());

        let err = table.link(new, 999, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
