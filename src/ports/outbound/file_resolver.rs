use crate::cataloging::domain::Location;
use crate::shared::Result;

/// FileResolver port: read-only file access over one view of a source
///
/// Implementations are immutable after construction and shared between
/// analyzers running in parallel, hence the `Send + Sync` bound.
///
/// Paths are absolute and `/`-separated relative to the source root. Symlinks
/// are followed; the returned location carries the resolved `real_path` and
/// keeps the requested path as `virtual_path`.
pub trait FileResolver: Send + Sync {
    /// Returns the locations of the given paths; missing paths are skipped
    ///
    /// # Errors
    /// Returns an error if a path escapes the source root or a link chain
    /// is too deep
    fn files_by_path(&self, paths: &[&str]) -> Result<Vec<Location>>;

    /// Returns every file matching any of the glob patterns (`*`, `?`, `**`)
    ///
    /// # Errors
    /// Returns an error if a pattern is invalid
    fn files_by_glob(&self, patterns: &[&str]) -> Result<Vec<Location>>;

    /// Reads the full contents of a file previously returned by this resolver
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or exceeds the size limit
    fn file_contents(&self, location: &Location) -> Result<Vec<u8>>;

    /// Resolves `path` in the same view (layer) that `location` came from
    fn relative_file_by_path(&self, location: &Location, path: &str) -> Option<Location>;

    /// Whether the path exists in this view
    fn has_path(&self, path: &str) -> bool;

    /// Reads a file as UTF-8 text, replacing invalid sequences
    fn file_contents_string(&self, location: &Location) -> Result<String> {
        let bytes = self.file_contents(location)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
