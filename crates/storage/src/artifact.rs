//! Content-addressed artifacts.
//!
//! An artifact's location is a pure function of its category and the MD5 of
//! its bytes: `<category>/<md5 hex>`. Identical uploads therefore land on the
//! same path, and the same bytes uploaded as a logo and as a mod file live in
//! two different places.

use crate::error::{ErrorKind, Result};
use crate::{BackendHandle, FileInfo};
use derive_more::Display;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::instrument;

/// Hex length of an MD5 digest.
const HASH_LEN: usize = 32;

/// Fixed per-entity subdirectory for stored blobs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    #[display("logo")]
    Logo,
    #[display("file")]
    File,
}
impl Category {
    pub const ALL: [Category; 2] = [Category::Logo, Category::File];
}
impl FromStr for Category {
    type Err = crate::error::Error;
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "logo" => Ok(Self::Logo),
            "file" => Ok(Self::File),
            other => exn::bail!(ErrorKind::Validation(format!("unknown artifact category `{other}`"))),
        }
    }
}

/// A stored blob: where it lives and what it claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub category: Category,
    /// Lowercase hex MD5 of the content.
    pub hash: String,
    /// Normalized media type declared at upload time.
    pub content_type: String,
}
impl Artifact {
    /// Path relative to the storage root.
    pub fn path(&self) -> PathBuf {
        relative_path(self.category, &self.hash)
    }
}

/// Relative storage path for a hash within a category.
pub fn relative_path(category: Category, hash: &str) -> PathBuf {
    Path::new(&category.to_string()).join(hash)
}

/// Absolute location of a blob under `root`.
///
/// Fails with [`Config`](ErrorKind::Config) when no root is configured and
/// with [`Validation`](ErrorKind::Validation) when `hash` is not an MD5 hex
/// digest, so a caller-supplied hash can never point outside its category.
pub fn absolute_path(root: Option<&Path>, category: Category, hash: &str) -> Result<PathBuf> {
    let root = root.ok_or_else(|| exn::Exn::from(ErrorKind::Config("storage root is not set".to_string())))?;
    check_hash(hash)?;
    Ok(root.join(relative_path(category, hash)))
}

/// Lowercase hex MD5 digest of `content`.
pub fn digest(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

fn check_hash(hash: &str) -> Result<()> {
    let valid = hash.len() == HASH_LEN && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !valid {
        exn::bail!(ErrorKind::Validation(format!("`{hash}` is not an md5 digest")));
    }
    Ok(())
}

/// Normalizes a declared media type.
///
/// The `type/subtype` essence is lower-cased and must consist of two
/// non-empty tokens; parameters after `;` are kept as given (trimmed).
pub fn content_type(declared: &str) -> Result<String> {
    let invalid = || ErrorKind::Validation(format!("unparsable media type `{declared}`"));
    let (essence, params) = match declared.split_once(';') {
        Some((essence, params)) => (essence, Some(params)),
        None => (declared, None),
    };
    let Some((kind, subtype)) = essence.trim().split_once('/') else {
        exn::bail!(invalid());
    };
    let is_token = |part: &str| {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_graphic() && !matches!(b, b'/' | b'"' | b'\\'))
    };
    if !is_token(kind) || !is_token(subtype) {
        exn::bail!(invalid());
    }
    let mut normalized = format!("{}/{}", kind.to_ascii_lowercase(), subtype.to_ascii_lowercase());
    for param in params.into_iter().flat_map(|p| p.split(';')).map(str::trim) {
        if param.is_empty() {
            continue;
        }
        if !param.contains('=') {
            exn::bail!(invalid());
        }
        normalized.push_str("; ");
        normalized.push_str(param);
    }
    Ok(normalized)
}

/// Write-once blob store on top of a [`StorageBackend`](crate::StorageBackend).
///
/// No caching: every read goes to the backend.
#[derive(Clone)]
pub struct ArtifactStore {
    backend: BackendHandle,
}
impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore").field("backend", &self.backend.name()).finish()
    }
}
impl ArtifactStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    /// Hash `content`, normalize its media type and write it under
    /// `<category>/<hash>`.
    ///
    /// A blob already present at that path is left untouched, so repeating
    /// the same upload is a no-op that returns the same artifact.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn put(&self, category: Category, content: &[u8], declared_media_type: &str) -> Result<Artifact> {
        if content.is_empty() {
            exn::bail!(ErrorKind::Validation("upload is empty".to_string()));
        }
        let content_type = content_type(declared_media_type)?;
        let artifact = Artifact { category, hash: digest(content), content_type };
        let path = artifact.path();
        if self.backend.exists(&path).await? {
            tracing::debug!(path = %path.display(), "artifact already stored");
            return Ok(artifact);
        }
        self.backend.write(&path, content).await?;
        tracing::info!(path = %path.display(), backend = self.backend.name(), "stored artifact");
        Ok(artifact)
    }

    /// Read a blob back.
    pub async fn get(&self, category: Category, hash: &str) -> Result<Vec<u8>> {
        check_hash(hash)?;
        self.backend.read(&relative_path(category, hash)).await
    }

    pub async fn exists(&self, category: Category, hash: &str) -> Result<bool> {
        check_hash(hash)?;
        self.backend.exists(&relative_path(category, hash)).await
    }

    /// Inventory of stored blobs in a category, for administrative cleanup.
    pub async fn list(&self, category: Category) -> Result<Vec<FileInfo>> {
        let prefix = PathBuf::from(category.to_string());
        let mut files = self.backend.list(Some(&prefix)).await?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use rstest::rstest;
    use std::sync::Arc;

    fn local_store() -> (tempfile::TempDir, ArtifactStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        (temp_dir, ArtifactStore::new(Arc::new(backend)))
    }

    #[test]
    fn test_digest_is_md5_hex() {
        assert_eq!(digest(b"a"), "0cc175b9c0f1b6a831c399e269772661");
        assert_eq!(digest(b"0123456789").len(), HASH_LEN);
    }

    #[rstest]
    #[case("image/png", "image/png")]
    #[case(" Image/PNG ", "image/png")]
    #[case("application/java-archive", "application/java-archive")]
    #[case("text/plain;charset=UTF-8", "text/plain; charset=UTF-8")]
    #[case("application/octet-stream; ", "application/octet-stream")]
    fn test_content_type_normalizes(#[case] declared: &str, #[case] expected: &str) {
        assert_eq!(content_type(declared).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("png")]
    #[case("image/")]
    #[case("/png")]
    #[case("image/png/extra")]
    #[case("image /png")]
    #[case("text/plain; charset")]
    fn test_content_type_rejects(#[case] declared: &str) {
        let err = content_type(declared).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[test]
    fn test_absolute_path() {
        let hash = digest(b"a");
        let path = absolute_path(Some(Path::new("/srv/solder")), Category::Logo, &hash).unwrap();
        assert_eq!(path, Path::new("/srv/solder/logo/0cc175b9c0f1b6a831c399e269772661"));
    }

    #[test]
    fn test_absolute_path_without_root() {
        let err = absolute_path(None, Category::File, &digest(b"a")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config(_)));
    }

    #[rstest]
    #[case("../../etc/passwd")]
    #[case("0CC175B9C0F1B6A831C399E269772661")]
    #[case("abc")]
    fn test_absolute_path_rejects_non_digest(#[case] hash: &str) {
        let err = absolute_path(Some(Path::new("/srv")), Category::File, hash).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
        assert!("icon".parse::<Category>().is_err());
    }

    #[tokio::test]
    async fn test_put_writes_under_category_and_hash() {
        let (temp_dir, store) = local_store();
        let artifact = store.put(Category::File, b"0123456789", "application/java-archive").await.unwrap();
        assert_eq!(artifact.hash, digest(b"0123456789"));
        assert_eq!(artifact.content_type, "application/java-archive");
        let on_disk = temp_dir.path().join("file").join(&artifact.hash);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"0123456789");
        assert_eq!(store.get(Category::File, &artifact.hash).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let (_temp_dir, store) = local_store();
        let first = store.put(Category::Logo, b"png bytes", "image/png").await.unwrap();
        let second = store.put(Category::Logo, b"png bytes", "image/png").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get(Category::Logo, &first.hash).await.unwrap(), b"png bytes");
        assert_eq!(store.list(Category::Logo).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_content_in_two_categories() {
        let (_temp_dir, store) = local_store();
        let logo = store.put(Category::Logo, b"same", "image/png").await.unwrap();
        let file = store.put(Category::File, b"same", "application/zip").await.unwrap();
        assert_eq!(logo.hash, file.hash);
        assert_ne!(logo.path(), file.path());
        assert_eq!(store.list(Category::Logo).await.unwrap().len(), 1);
        assert_eq!(store.list(Category::File).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_empty_content() {
        let (_temp_dir, store) = local_store();
        let err = store.put(Category::File, b"", "application/zip").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert!(store.list(Category::File).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_rejects_bad_media_type_before_writing() {
        let (_temp_dir, store) = local_store();
        let err = store.put(Category::File, b"data", "not a type").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert!(store.list(Category::File).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_temp_dir, store) = local_store();
        let err = store.get(Category::File, &digest(b"never stored")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(!store.exists(Category::File, &digest(b"never stored")).await.unwrap());
    }
}
