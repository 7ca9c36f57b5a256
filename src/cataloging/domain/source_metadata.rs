use super::identity::content_id;
use std::fmt;
use std::str::FromStr;

/// Scheme of a cataloging target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Directory,
    Image,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Directory => "directory",
            Scheme::Image => "image",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope selects which view of a layered image a resolver exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Unspecified,
    Squashed,
    AllLayers,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Unspecified => "unspecified",
            Scope::Squashed => "squashed",
            Scope::AllLayers => "all-layers",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "squashed" => Ok(Scope::Squashed),
            "all-layers" | "alllayers" => Ok(Scope::AllLayers),
            "unspecified" => Ok(Scope::Unspecified),
            _ => Err(format!(
                "Invalid scope: {}. Please specify 'squashed' or 'all-layers'",
                s
            )),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one image layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerMetadata {
    pub index: usize,
    pub digest: String,
    pub media_type: String,
    pub size: u64,
}

/// Description of a container image target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageMetadata {
    /// The reference as the user typed it
    pub user_input: String,
    /// Digest of the image config
    pub id: String,
    pub manifest_digest: String,
    pub media_type: String,
    pub tags: Vec<String>,
    pub size: u64,
    pub layers: Vec<LayerMetadata>,
}

/// SourceMetadata describes what was cataloged
///
/// The variant decides the scheme, so exactly one of the directory path or
/// the image description is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMetadata {
    Directory { path: String },
    Image(ImageMetadata),
}

impl SourceMetadata {
    pub fn directory(path: impl Into<String>) -> Self {
        SourceMetadata::Directory { path: path.into() }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            SourceMetadata::Directory { .. } => Scheme::Directory,
            SourceMetadata::Image(_) => Scheme::Image,
        }
    }

    /// Display name: the directory path or the image reference
    pub fn name(&self) -> &str {
        match self {
            SourceMetadata::Directory { path } => path,
            SourceMetadata::Image(image) => &image.user_input,
        }
    }

    /// Content-addressed identifier of the source used by relationships
    pub fn id(&self) -> String {
        let key = match self {
            SourceMetadata::Directory { path } => format!("directory\u{0}{}", path),
            SourceMetadata::Image(image) => format!(
                "image\u{0}{}\u{0}{}\u{0}{}",
                image.user_input, image.id, image.manifest_digest
            ),
        };
        content_id(key.as_bytes())
    }
}
