//! Path validation for storage backends.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a relative storage path and refuses anything that would leave
/// the storage root.
///
/// `.` segments and repeated separators are dropped, `..` is resolved against
/// the components seen so far, and a path that resolves to nothing is
/// rejected. Null bytes are rejected outright.
///
/// ```
/// use std::path::Path;
/// use solder_storage::validate_path;
///
/// assert!(validate_path("logo/0cc175b9c0f1b6a831c399e269772661").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("file/../../escape").is_err());
/// assert_eq!(validate_path("file//./abc/").unwrap(), Path::new("file/abc"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Path::components() lets null bytes through on Unix.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
