use std::path::{Component, Path};

use crate::StoreError;

/// Validates that a target path stays inside the object tree.
///
/// Rejects:
/// - Empty paths
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_target_path(target: &str) -> Result<(), StoreError> {
    if target.is_empty() {
        return Err(StoreError::InvalidPath("empty path".into()));
    }

    let path = Path::new(target);

    if path.is_absolute() {
        return Err(StoreError::InvalidPath(format!(
            "absolute path not allowed: {target}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(StoreError::InvalidPath(format!(
                    "parent directory traversal not allowed: {target}"
                )));
            }
            Component::Prefix(_) => {
                return Err(StoreError::InvalidPath(format!(
                    "path prefix not allowed: {target}"
                )));
            }
            Component::RootDir => {
                return Err(StoreError::InvalidPath(format!(
                    "absolute path not allowed: {target}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        assert!(validate_target_path("").is_err());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert!(validate_target_path("../../../etc/passwd").is_err());
    }

    #[test]
    fn rejects_nested_parent_dir_traversal() {
        assert!(validate_target_path("sub/../../../escape").is_err());
    }

    #[test]
    fn rejects_absolute_unix_path() {
        assert!(validate_target_path("/tmp/malicious").is_err());
    }

    #[test]
    fn rejects_single_parent_dir() {
        assert!(validate_target_path("..").is_err());
    }

    #[test]
    fn accepts_simple_filename() {
        assert!(validate_target_path("report.pdf").is_ok());
    }

    #[test]
    fn accepts_subdirectory_path() {
        assert!(validate_target_path("sub/dir/file.txt").is_ok());
    }

    #[test]
    fn accepts_dotfile() {
        assert!(validate_target_path(".config/settings.json").is_ok());
    }

    #[test]
    fn accepts_current_dir_prefix() {
        assert!(validate_target_path("./report.pdf").is_ok());
    }
}
