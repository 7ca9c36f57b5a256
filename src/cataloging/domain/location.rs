use super::identity::content_id;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// LayerRef identifies the image layer a location was found in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerRef {
    pub index: usize,
    pub digest: String,
}

impl LayerRef {
    pub fn new(index: usize, digest: impl Into<String>) -> Self {
        Self {
            index,
            digest: digest.into(),
        }
    }
}

/// Coordinates value object: the identity of a file within a source
///
/// Two locations are the same file when their real path and originating
/// layer match. How the file was reached (the virtual path) is not part of
/// the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinates {
    real_path: String,
    layer_digest: Option<String>,
}

impl Coordinates {
    pub fn new(real_path: impl Into<String>, layer_digest: Option<String>) -> Self {
        Self {
            real_path: clean_path(&real_path.into()),
            layer_digest,
        }
    }

    pub fn real_path(&self) -> &str {
        &self.real_path
    }

    pub fn layer_digest(&self) -> Option<&str> {
        self.layer_digest.as_deref()
    }

    /// Content-addressed file identifier used in relationships and documents
    pub fn id(&self) -> String {
        let key = format!(
            "{}\u{0}{}",
            self.real_path,
            self.layer_digest.as_deref().unwrap_or_default()
        );
        content_id(key.as_bytes())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.layer_digest {
            Some(layer) => write!(f, "{} ({})", self.real_path, layer),
            None => write!(f, "{}", self.real_path),
        }
    }
}

/// Location value object: a file as returned by a resolver
///
/// `virtual_path` records the path a lookup went through when it differs
/// from the real path (for example through a symlink). It exists only to
/// disambiguate lookups and is never serialized into documents.
#[derive(Debug, Clone)]
pub struct Location {
    real_path: String,
    virtual_path: Option<String>,
    layer: Option<LayerRef>,
}

impl Location {
    pub fn new(real_path: impl Into<String>) -> Self {
        Self {
            real_path: clean_path(&real_path.into()),
            virtual_path: None,
            layer: None,
        }
    }

    pub fn in_layer(mut self, layer: LayerRef) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_virtual_path(mut self, virtual_path: impl Into<String>) -> Self {
        let virtual_path = clean_path(&virtual_path.into());
        if virtual_path != self.real_path {
            self.virtual_path = Some(virtual_path);
        }
        self
    }

    pub fn real_path(&self) -> &str {
        &self.real_path
    }

    pub fn virtual_path(&self) -> Option<&str> {
        self.virtual_path.as_deref()
    }

    /// The path the file was requested through (virtual if present, otherwise real)
    pub fn access_path(&self) -> &str {
        self.virtual_path.as_deref().unwrap_or(&self.real_path)
    }

    pub fn layer(&self) -> Option<&LayerRef> {
        self.layer.as_ref()
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            real_path: self.real_path.clone(),
            layer_digest: self.layer.as_ref().map(|l| l.digest.clone()),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.real_path == other.real_path
            && self.layer.as_ref().map(|l| &l.digest) == other.layer.as_ref().map(|l| &l.digest)
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.real_path.hash(state);
        self.layer.as_ref().map(|l| &l.digest).hash(state);
    }
}

/// LocationSet keeps evidencing locations in insertion order with set semantics
///
/// Equality ignores order: two sets are equal when they hold the same
/// coordinates.
#[derive(Debug, Clone, Default)]
pub struct LocationSet {
    items: Vec<Location>,
    seen: HashSet<Coordinates>,
}

impl LocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a location, returning false when its coordinates were already present
    pub fn insert(&mut self, location: Location) -> bool {
        if self.seen.insert(location.coordinates()) {
            self.items.push(location);
            true
        } else {
            false
        }
    }

    /// Unions another set into this one, returning how many locations were new
    pub fn extend<I: IntoIterator<Item = Location>>(&mut self, locations: I) -> usize {
        locations
            .into_iter()
            .map(|l| self.insert(l))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        self.seen.contains(coordinates)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinates> + '_ {
        self.items.iter().map(Location::coordinates)
    }
}

impl PartialEq for LocationSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for LocationSet {}

impl FromIterator<Location> for LocationSet {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        let mut set = LocationSet::new();
        set.extend(iter);
        set
    }
}

/// Lexically normalizes a path into absolute, `/`-separated form
///
/// `.` segments and repeated separators are dropped and `..` pops a segment
/// without ever climbing above `/`.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("a/b/c"), "/a/b/c");
        assert_eq!(clean_path("/a//b/./c/"), "/a/b/c");
        assert_eq!(clean_path("/a/b/../c"), "/a/c");
        assert_eq!(clean_path("/../../etc"), "/etc");
        assert_eq!(clean_path(""), "/");
    }

    #[test]
    fn test_location_equality_ignores_virtual_path() {
        let a = Location::new("/usr/lib/libc.so.6");
        let b = Location::new("/usr/lib/libc.so.6").with_virtual_path("/lib/libc.so.6");
        assert_eq!(a, b);
    }

    #[test]
    fn test_location_equality_respects_layer() {
        let a = Location::new("/etc/passwd").in_layer(LayerRef::new(0, "sha256:aaa"));
        let b = Location::new("/etc/passwd").in_layer(LayerRef::new(1, "sha256:bbb"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_virtual_path_dropped_when_same_as_real() {
        let loc = Location::new("/a/b").with_virtual_path("/a/./b");
        assert_eq!(loc.virtual_path(), None);
        assert_eq!(loc.access_path(), "/a/b");
    }

    #[test]
    fn test_location_set_deduplicates() {
        let mut set = LocationSet::new();
        assert!(set.insert(Location::new("/some/path/pkg1")));
        assert!(!set.insert(Location::new("/some/path/pkg1").with_virtual_path("/link")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_location_set_preserves_insertion_order() {
        let set: LocationSet = vec![Location::new("/z"), Location::new("/a"), Location::new("/m")]
            .into_iter()
            .collect();
        let paths: Vec<&str> = set.iter().map(|l| l.real_path()).collect();
        assert_eq!(paths, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn test_location_set_equality_ignores_order() {
        let a: LocationSet = vec![Location::new("/a"), Location::new("/b")].into_iter().collect();
        let b: LocationSet = vec![Location::new("/b"), Location::new("/a")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_coordinates_id_depends_on_layer() {
        let a = Coordinates::new("/etc/os-release", None);
        let b = Coordinates::new("/etc/os-release", Some("sha256:abc".to_string()));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), Coordinates::new("/etc/os-release", None).id());
    }
}
