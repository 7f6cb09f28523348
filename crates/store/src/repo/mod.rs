//! Per-entity repositories.
//!
//! Each repository owns the association tables of the relations its entity
//! sits on the left of, and an [`ArtifactStore`] when the entity carries an
//! uploaded file. Inputs share one shape for create and update: every field is
//! optional, absent fields are left untouched on update, and an empty string
//! clears an optional field.

mod builds;
mod identities;
mod mods;
mod packs;
mod releases;
mod versions;

pub use self::builds::{BuildInput, Builds};
pub use self::identities::{Identities, IdentityInput};
pub use self::mods::{ModInput, Mods};
pub use self::packs::{PackInput, Packs};
pub use self::releases::{Forges, Minecrafts, Release, Releases, SyncOutcome};
pub use self::versions::{VersionInput, Versions};
use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Clients, Teams, Users};
use solder_storage::{Artifact, ArtifactStore, Category};

/// Decoded upload, ready to be handed to the artifact store.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub content: Vec<u8>,
    pub media_type: String,
}
impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("content", &format_args!("{} bytes", self.content.len()))
            .field("media_type", &self.media_type)
            .finish()
    }
}

/// Write the upload (if any) before the row referencing it is touched.
pub(crate) async fn put_upload(
    artifacts: &ArtifactStore,
    category: Category,
    upload: Option<&Upload>,
) -> Result<Option<Artifact>> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let artifact = artifacts
        .put(category, &upload.content, &upload.media_type)
        .await
        .map_err(ErrorKind::storage)?;
    Ok(Some(artifact))
}

/// Apply an optional text field: absent keeps `current`, blank clears.
pub(crate) fn patch_text(value: Option<String>, current: Option<String>) -> Option<String> {
    match value {
        None => current,
        Some(value) => Some(value.trim().to_string()).filter(|v| !v.is_empty()),
    }
}

/// Every repository, built from one database and one artifact store.
#[derive(Debug, Clone)]
pub struct Store {
    pub packs: Packs,
    pub builds: Builds,
    pub mods: Mods,
    pub versions: Versions,
    pub minecrafts: Minecrafts,
    pub forges: Forges,
    pub users: Identities<Users>,
    pub teams: Identities<Teams>,
    pub clients: Identities<Clients>,
}
impl Store {
    pub fn new(db: &Database, artifacts: ArtifactStore) -> Self {
        let pool = db.pool().clone();
        Self {
            packs: Packs::new(pool.clone(), artifacts.clone()),
            builds: Builds::new(pool.clone()),
            mods: Mods::new(pool.clone()),
            versions: Versions::new(pool.clone(), artifacts),
            minecrafts: Releases::new(pool.clone()),
            forges: Releases::new(pool.clone()),
            users: Identities::new(pool.clone()),
            teams: Identities::new(pool.clone()),
            clients: Identities::new(pool),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("old"), Some("old"))]
    #[case(Some(""), Some("old"), None)]
    #[case(Some("  "), None, None)]
    #[case(Some(" new "), Some("old"), Some("new"))]
    fn test_patch_text(#[case] value: Option<&str>, #[case] current: Option<&str>, #[case] expected: Option<&str>) {
        let patched = patch_text(value.map(String::from), current.map(String::from));
        assert_eq!(patched.as_deref(), expected);
    }

    #[test]
    fn test_upload_debug_hides_content() {
        let upload = Upload { content: vec![0; 10], media_type: "image/png".to_string() };
        assert_eq!(format!("{upload:?}"), r#"Upload { content: 10 bytes, media_type: "image/png" }"#);
    }
}
