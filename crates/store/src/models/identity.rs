//! Users, teams and clients.
//!
//! These only carry an identity (name and slug) so they can take part in
//! associations; one generic model serves all three tables.

use super::{Entity, Id, timestamp};
use crate::error::Error;
use serde::Serialize;
use std::marker::PhantomData;
use time::OffsetDateTime;

/// Table and naming for one identity kind.
pub trait IdentityKind: Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    const KIND: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Users {}
impl IdentityKind for Users {
    const TABLE: &'static str = "users";
    const KIND: &'static str = "user";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teams {}
impl IdentityKind for Teams {
    const TABLE: &'static str = "teams";
    const KIND: &'static str = "team";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clients {}
impl IdentityKind for Clients {
    const TABLE: &'static str = "clients";
    const KIND: &'static str = "client";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct Identity<K> {
    pub id: Id,
    pub name: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

pub type User = Identity<Users>;
pub type Team = Identity<Teams>;
pub type Client = Identity<Clients>;

#[derive(Debug, sqlx::FromRow)]
pub struct IdentityRow {
    id: i64,
    name: String,
    slug: String,
    created_at: i64,
    updated_at: i64,
}
impl<K> TryFrom<IdentityRow> for Identity<K> {
    type Error = Error;
    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
            kind: PhantomData,
        })
    }
}
impl<K: IdentityKind> Entity for Identity<K> {
    const TABLE: &'static str = K::TABLE;
    const KIND: &'static str = K::KIND;
    type Row = IdentityRow;

    fn id(&self) -> Id {
        self.id
    }
}
