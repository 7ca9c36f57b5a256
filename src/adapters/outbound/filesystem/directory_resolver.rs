use crate::cataloging::domain::{clean_path, Location};
use crate::cataloging::services::GlobPattern;
use crate::ports::outbound::FileResolver;
use crate::shared::error::CatalogerError;
use crate::shared::security::{validate_file_size, validate_within_root, MAX_FILE_SIZE};
use crate::shared::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// DirectoryResolver adapter exposing a host directory as a source
///
/// The path index is built on first use and never changes afterwards, so
/// the resolver can be shared between threads without locking.
#[derive(Debug)]
pub struct DirectoryResolver {
    root: PathBuf,
    max_file_size: u64,
    index: OnceLock<Vec<String>>,
}

impl DirectoryResolver {
    /// Creates a resolver rooted at `root`
    ///
    /// # Errors
    /// Returns `SourceUnavailable` if the root does not exist or is not a directory
    pub fn new(root: &Path) -> Result<Self> {
        let unavailable = |reason: String| CatalogerError::SourceUnavailable {
            input: root.display().to_string(),
            reason,
        };

        let canonical = root.canonicalize().map_err(|e| unavailable(e.to_string()))?;
        if !canonical.is_dir() {
            return Err(unavailable("not a directory".to_string()).into());
        }

        Ok(Self {
            root: canonical,
            max_file_size: MAX_FILE_SIZE,
            index: OnceLock::new(),
        })
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        self.root.join(clean_path(path).trim_start_matches('/'))
    }

    fn source_path(&self, host: &Path) -> Option<String> {
        host.strip_prefix(&self.root)
            .ok()
            .map(|relative| clean_path(&relative.to_string_lossy()))
    }

    /// Every non-directory entry below the root, in sorted walk order
    fn index(&self) -> &[String] {
        self.index.get_or_init(|| {
            let mut paths = Vec::new();
            for entry in WalkDir::new(&self.root)
                .follow_links(false)
                .sort_by_file_name()
            {
                match entry {
                    Ok(entry) if !entry.file_type().is_dir() => {
                        if let Some(path) = self.source_path(entry.path()) {
                            paths.push(path);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "skipping unreadable directory entry"),
                }
            }
            tracing::debug!(root = %self.root.display(), files = paths.len(), "indexed directory");
            paths
        })
    }

    /// Resolves one path, following symlinks without leaving the root
    fn resolve(&self, path: &str) -> Result<Option<Location>> {
        let requested = clean_path(path);
        let host = self.host_path(&requested);

        // Missing files and dangling links are simply absent
        if !host.exists() {
            return Ok(None);
        }

        let canonical = validate_within_root(&self.root, &host)?;
        if canonical.is_dir() {
            return Ok(None);
        }

        Ok(self
            .source_path(&canonical)
            .map(|real| Location::new(real).with_virtual_path(requested)))
    }
}

impl FileResolver for DirectoryResolver {
    fn files_by_path(&self, paths: &[&str]) -> Result<Vec<Location>> {
        let mut locations = Vec::new();
        for path in paths {
            if let Some(location) = self.resolve(path)? {
                locations.push(location);
            }
        }
        Ok(locations)
    }

    fn files_by_glob(&self, patterns: &[&str]) -> Result<Vec<Location>> {
        let patterns = patterns
            .iter()
            .map(|p| GlobPattern::new(p))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        let mut locations = Vec::new();
        for path in self.index() {
            if !patterns.iter().any(|p| p.matches(path)) {
                continue;
            }
            match self.resolve(path) {
                Ok(Some(location)) => {
                    if seen.insert(location.access_path().to_string()) {
                        locations.push(location);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path, error = %e, "skipping glob match"),
            }
        }
        Ok(locations)
    }

    fn file_contents(&self, location: &Location) -> Result<Vec<u8>> {
        let host = self.host_path(location.real_path());
        let canonical = validate_within_root(&self.root, &host)?;

        let metadata = fs::metadata(&canonical).map_err(|e| CatalogerError::FileReadError {
            path: host.clone(),
            details: e.to_string(),
        })?;
        validate_file_size(metadata.len(), &host, self.max_file_size)?;

        fs::read(&canonical).map_err(|e| {
            CatalogerError::FileReadError {
                path: host,
                details: e.to_string(),
            }
            .into()
        })
    }

    fn relative_file_by_path(&self, _location: &Location, path: &str) -> Option<Location> {
        self.resolve(path).ok().flatten()
    }

    fn has_path(&self, path: &str) -> bool {
        fs::symlink_metadata(self.host_path(path)).is_ok()
    }
}
