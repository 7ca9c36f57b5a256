use crate::shared::error::CatalogerError;
use crate::shared::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum file size read through a resolver (100 MB)
/// This prevents DoS attacks via excessively large files
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum number of symlink hops followed while resolving a path
pub const MAX_LINK_DEPTH: usize = 40;

/// Validates that a path is not a symbolic link
///
/// # Security
/// This function uses `symlink_metadata()` instead of `metadata()` to ensure
/// we check the symlink itself, not the target it points to.
///
/// # Errors
/// Returns an error if the path is a symbolic link or if metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Validates file size is within acceptable limits
///
/// # Errors
/// Returns an error if the file size exceeds the maximum
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Canonicalizes `candidate` and verifies it stays inside `root`
///
/// `root` must already be canonical. Symlinks inside a cataloged directory
/// may point anywhere on the host; following one out of the root would
/// catalog files that are not part of the source.
///
/// # Errors
/// Returns a `SecurityError` if the resolved path escapes the root
pub fn validate_within_root(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let canonical = candidate.canonicalize().map_err(|e| CatalogerError::FileReadError {
        path: candidate.to_path_buf(),
        details: e.to_string(),
    })?;

    if !canonical.starts_with(root) {
        return Err(CatalogerError::SecurityError {
            path: candidate.to_path_buf(),
            reason: format!("Resolves to {} outside of the source root", canonical.display()),
            hint: "Catalog the link target directly if it should be included".to_string(),
        }
        .into());
    }

    Ok(canonical)
}
