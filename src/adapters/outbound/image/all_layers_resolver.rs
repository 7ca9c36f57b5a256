use super::file_tree::{layer_location, read_layer_file, FileTree};
use crate::cataloging::domain::{clean_path, Image, Location};
use crate::cataloging::services::GlobPattern;
use crate::ports::outbound::FileResolver;
use crate::shared::security::MAX_FILE_SIZE;
use crate::shared::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// AllLayersResolver adapter: every layer's contribution, unmerged
///
/// A path yields one location per layer that wrote it, each tagged with that
/// layer. Files deleted by a later layer are still returned for the layers
/// that contain them. Symlinks resolve against the view as of their layer.
#[derive(Debug)]
pub struct AllLayersResolver {
    image: Arc<Image>,
    trees: Vec<FileTree>,
    max_file_size: u64,
}

impl AllLayersResolver {
    pub fn new(image: Arc<Image>) -> Self {
        let trees = FileTree::per_layer(image.layers());
        Self {
            image,
            trees,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Resolves `path` in the view after layer `index`
    fn resolve_in(&self, index: usize, path: &str) -> Result<Option<Location>> {
        let Some(tree) = self.trees.get(index) else {
            return Ok(None);
        };
        let requested = clean_path(path);
        Ok(tree
            .resolve(&requested)?
            .filter(|(_, node)| !node.entry.is_dir())
            .map(|(real, node)| layer_location(&self.image, &real, node, &requested)))
    }
}

impl FileResolver for AllLayersResolver {
    fn files_by_path(&self, paths: &[&str]) -> Result<Vec<Location>> {
        let mut seen = BTreeSet::new();
        let mut locations = Vec::new();
        for path in paths {
            let requested = clean_path(path);
            for (index, tree) in self.trees.iter().enumerate() {
                // Only layers that wrote the path itself or the file it resolves to
                let wrote_path = tree.node(&requested).map(|n| n.layer) == Some(index);
                let wrote_target = tree
                    .resolve(&requested)
                    .ok()
                    .flatten()
                    .is_some_and(|(_, node)| node.layer == index);
                if !wrote_path && !wrote_target {
                    continue;
                }
                if let Some(location) = self.resolve_in(index, &requested)? {
                    let key = (
                        location.real_path().to_string(),
                        location.layer().map(|l| l.index),
                    );
                    if seen.insert(key) {
                        locations.push(location);
                    }
                }
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
        for (index, layer) in self.image.layers().iter().enumerate() {
            for path in layer.entries.keys() {
                if !patterns.iter().any(|p| p.matches(path)) {
                    continue;
                }
                match self.resolve_in(index, path) {
                    Ok(Some(location)) => {
                        let key = (
                            location.access_path().to_string(),
                            location.layer().map(|l| l.index),
                        );
                        if seen.insert(key) {
                            locations.push(location);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(path = %path, layer = index, error = %e, "skipping glob match"),
                }
            }
        }
        Ok(locations)
    }

    fn file_contents(&self, location: &Location) -> Result<Vec<u8>> {
        read_layer_file(&self.image, location, self.max_file_size)
    }

    fn relative_file_by_path(&self, location: &Location, path: &str) -> Option<Location> {
        let index = location
            .layer()
            .map(|l| l.index)
            .unwrap_or_else(|| self.trees.len().saturating_sub(1));
        self.resolve_in(index, path).ok().flatten()
    }

    fn has_path(&self, path: &str) -> bool {
        self.trees.iter().any(|tree| tree.contains(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::image::docker_archive::test_archive::{
        layer_tar, write_image, Item,
    };
    use crate::adapters::outbound::image::DockerArchiveProvider;
    use crate::ports::outbound::ImageProvider;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn image(layers: &[Vec<u8>]) -> Arc<Image> {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("image.tar");
        write_image(&archive, layers);
        Arc::new(
            DockerArchiveProvider::new()
                .provide(
                    &archive.to_string_lossy(),
                    TempDir::new().unwrap(),
                    &CancellationToken::new(),
                )
                .unwrap(),
        )
    }

    fn whiteout_image() -> Arc<Image> {
        image(&[
            layer_tar(&[
                Item::File("etc/os-release", "ID=alpine\n"),
                Item::File("opt/app/secret", "s3cr3t"),
            ]),
            layer_tar(&[
                Item::File("etc/os-release", "ID=debian\n"),
                Item::Whiteout("opt/app/secret"),
            ]),
        ])
    }

    #[test]
    fn test_one_location_per_layer() {
        let resolver = AllLayersResolver::new(whiteout_image());
        let locations = resolver.files_by_path(&["/etc/os-release"]).unwrap();
        let layers: Vec<usize> = locations.iter().map(|l| l.layer().unwrap().index).collect();
        assert_eq!(layers, vec![0, 1]);
        assert_eq!(
            resolver.file_contents_string(&locations[0]).unwrap(),
            "ID=alpine\n"
        );
        assert_eq!(
            resolver.file_contents_string(&locations[1]).unwrap(),
            "ID=debian\n"
        );
    }

    #[test]
    fn test_deleted_file_still_visible_in_its_layer() {
        let resolver = AllLayersResolver::new(whiteout_image());
        let locations = resolver.files_by_path(&["/opt/app/secret"]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].layer().unwrap().index, 0);
        assert!(resolver.has_path("/opt/app/secret"));
    }

    #[test]
    fn test_glob_spans_layers() {
        let resolver = AllLayersResolver::new(whiteout_image());
        let locations = resolver.files_by_glob(&["/etc/*"]).unwrap();
        assert_eq!(locations.len(), 2);
        assert_ne!(
            locations[0].layer().unwrap().digest,
            locations[1].layer().unwrap().digest
        );
    }

    #[test]
    fn test_relative_file_uses_location_layer() {
        let resolver = AllLayersResolver::new(whiteout_image());
        let base = resolver.files_by_path(&["/opt/app/secret"]).unwrap().remove(0);
        let sibling = resolver.relative_file_by_path(&base, "/etc/os-release").unwrap();
        assert_eq!(sibling.layer().unwrap().index, 0);
    }

    #[test]
    fn test_symlink_resolves_against_its_layer() {
        let resolver = AllLayersResolver::new(image(&[
            layer_tar(&[Item::File("usr/lib/libz.so.1.3", "z")]),
            layer_tar(&[Item::Symlink("usr/lib/libz.so.1", "libz.so.1.3")]),
        ]));
        let locations = resolver.files_by_path(&["/usr/lib/libz.so.1"]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].real_path(), "/usr/lib/libz.so.1.3");
        assert_eq!(locations[0].layer().unwrap().index, 0);
    }

    #[test]
    fn test_symlinked_parent_directory_is_followed() {
        let resolver = AllLayersResolver::new(image(&[layer_tar(&[
            Item::File("usr/lib/libz.so", "z"),
            Item::Symlink("lib", "usr/lib"),
        ])]));
        let locations = resolver.files_by_path(&["/lib/libz.so"]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].real_path(), "/usr/lib/libz.so");
        assert_eq!(locations[0].virtual_path(), Some("/lib/libz.so"));
        assert_eq!(locations[0].layer().unwrap().index, 0);
        assert_eq!(resolver.file_contents_string(&locations[0]).unwrap(), "z");
    }

    #[test]
    fn test_symlinked_parent_only_reports_layers_that_wrote_the_file() {
        let resolver = AllLayersResolver::new(image(&[
            layer_tar(&[
                Item::File("usr/lib/libz.so", "z"),
                Item::Symlink("lib", "usr/lib"),
            ]),
            layer_tar(&[Item::File("etc/hostname", "box\n")]),
        ]));
        let locations = resolver.files_by_path(&["/lib/libz.so"]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].layer().unwrap().index, 0);
    }
}
