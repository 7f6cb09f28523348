//! Generic single-table queries shared by every repository.
//!
//! Entities are addressed from the outside by a key that is either their
//! numeric id or their slug (releases use their upstream name instead).
//! Resolution tries the id first and falls back to the slug, so a pack whose
//! slug happens to be `"7"` is shadowed by the pack with id 7.

use crate::error::{ErrorKind, Result, SqlxResultExt, still_referenced};
use crate::models::{Entity, Id};
use exn::ResultExt;
use sqlx::SqlitePool;

/// Restricts a lookup to rows owned by a parent, e.g. builds of one pack.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    pub column: &'static str,
    pub id: Id,
}

/// Find by id or key column (`slug` or `name`), id first.
pub(crate) async fn find<E: Entity>(
    pool: &SqlitePool,
    key_column: &str,
    key: &str,
    scope: Option<Scope>,
) -> Result<Option<E>> {
    let id: Option<Id> = key.parse().ok();
    let scoped = match scope {
        Some(scope) => format!("AND {} = ?3", scope.column),
        None => String::new(),
    };
    let sql = format!(
        "SELECT * FROM {table} WHERE (id = ?1 OR {key_column} = ?2) {scoped} \
         ORDER BY CASE WHEN id = ?1 THEN 0 ELSE 1 END LIMIT 1",
        table = E::TABLE,
    );
    let mut query = sqlx::query_as::<_, E::Row>(&sql).bind(id).bind(key);
    if let Some(scope) = scope {
        query = query.bind(scope.id);
    }
    let row = query.fetch_optional(pool).await.or_raise(|| ErrorKind::Database)?;
    row.map(E::try_from).transpose()
}

/// [`find`], failing with [`NotFound`](ErrorKind::NotFound) when nothing matches.
pub(crate) async fn resolve<E: Entity>(
    pool: &SqlitePool,
    key_column: &str,
    key: &str,
    scope: Option<Scope>,
) -> Result<E> {
    find(pool, key_column, key, scope)
        .await?
        .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{} `{key}`", E::KIND))))
}

pub(crate) async fn by_id<E: Entity>(pool: &SqlitePool, id: Id) -> Result<E> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", E::TABLE);
    let row: Option<E::Row> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await.or_raise(|| ErrorKind::Database)?;
    let row = row.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{} {id}", E::KIND))))?;
    E::try_from(row)
}

/// All rows ordered by name, ties broken by id.
pub(crate) async fn list<E: Entity>(pool: &SqlitePool, scope: Option<Scope>) -> Result<Vec<E>> {
    let filter = match scope {
        Some(scope) => format!("WHERE {} = ?", scope.column),
        None => String::new(),
    };
    let sql = format!("SELECT * FROM {} {filter} ORDER BY name ASC, id ASC", E::TABLE);
    let mut query = sqlx::query_as::<_, E::Row>(&sql);
    if let Some(scope) = scope {
        query = query.bind(scope.id);
    }
    let rows = query.fetch_all(pool).await.or_raise(|| ErrorKind::Database)?;
    rows.into_iter().map(E::try_from).collect()
}

/// Delete by id. Rows still referenced by links or children are refused.
pub(crate) async fn delete<E: Entity>(pool: &SqlitePool, id: Id) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .or_constraint(|| ErrorKind::Database, still_referenced(E::KIND))?;
    if result.rows_affected() == 0 {
        exn::bail!(ErrorKind::NotFound(format!("{} {id}", E::KIND)));
    }
    Ok(())
}

/// Derive a slug from an explicit value or, failing that, from the name.
pub(crate) fn slug(name: &str, explicit: Option<&str>) -> Result<String> {
    let source = explicit.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(name);
    let slug = rslug::slugify!(source);
    if slug.is_empty() {
        exn::bail!(ErrorKind::Validation(format!("cannot derive a slug from `{source}`")));
    }
    Ok(slug)
}

/// Trimmed, non-empty name or a validation error.
pub(crate) fn required_name(kind: &str, name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => exn::bail!(ErrorKind::Validation(format!("{kind} name is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tech Pack", None, "tech-pack")]
    #[case("Tech Pack", Some("  "), "tech-pack")]
    #[case("Tech Pack", Some("Custom Slug"), "custom-slug")]
    #[case("1.12.2", None, "1-12-2")]
    fn test_slug(#[case] name: &str, #[case] explicit: Option<&str>, #[case] expected: &str) {
        assert_eq!(slug(name, explicit).unwrap(), expected);
    }

    #[test]
    fn test_slug_rejects_symbols_only() {
        let err = slug("!!!", None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_required_name(#[case] name: Option<&str>) {
        let err = required_name("pack", name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }
}
