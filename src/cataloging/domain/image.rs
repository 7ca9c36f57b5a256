use super::{ImageMetadata, LayerMetadata};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Kind of an entry recorded in a layer's file tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic link with its target as written in the archive
    Symlink(String),
}

/// One path contributed by a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub kind: EntryKind,
    pub size: u64,
    /// Where the file body was extracted to inside the image workspace
    pub content: Option<PathBuf>,
}

impl LayerEntry {
    pub fn file(size: u64, content: PathBuf) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            content: Some(content),
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            content: None,
        }
    }

    pub fn symlink(target: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Symlink(target.into()),
            size: 0,
            content: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Layer: the file tree a single image layer adds, plus what it deletes
///
/// Paths are cleaned absolute paths. `whiteouts` hold paths the layer
/// removes from lower layers, `opaque_dirs` directories whose lower-layer
/// contents are hidden.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub metadata: LayerMetadata,
    pub entries: BTreeMap<String, LayerEntry>,
    pub whiteouts: BTreeSet<String>,
    pub opaque_dirs: BTreeSet<String>,
}

impl Layer {
    pub fn new(metadata: LayerMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }
}

/// Image: an ordered stack of layers materialized into a scratch workspace
///
/// The workspace directory is removed when the image is dropped, whether
/// cataloging succeeded or not.
#[derive(Debug)]
pub struct Image {
    metadata: ImageMetadata,
    layers: Vec<Layer>,
    workspace: TempDir,
}

impl Image {
    pub fn new(metadata: ImageMetadata, layers: Vec<Layer>, workspace: TempDir) -> Self {
        Self {
            metadata,
            layers,
            workspace,
        }
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Layers ordered bottom (base) to top
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }
}
