use super::file_tree::{layer_location, read_layer_file, FileTree};
use crate::cataloging::domain::{clean_path, Image, Location};
use crate::cataloging::services::GlobPattern;
use crate::ports::outbound::FileResolver;
use crate::shared::security::MAX_FILE_SIZE;
use crate::shared::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// SquashedResolver adapter: the image as a running container would see it
///
/// Every path appears at most once, attributed to the topmost layer that
/// wrote it; files deleted by whiteouts or hidden by opaque directories are
/// absent.
#[derive(Debug)]
pub struct SquashedResolver {
    image: Arc<Image>,
    tree: FileTree,
    max_file_size: u64,
}

impl SquashedResolver {
    pub fn new(image: Arc<Image>) -> Self {
        let tree = FileTree::squash(image.layers());
        Self {
            image,
            tree,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    fn resolve(&self, path: &str) -> Result<Option<Location>> {
        let requested = clean_path(path);
        Ok(self
            .tree
            .resolve(&requested)?
            .filter(|(_, node)| !node.entry.is_dir())
            .map(|(real, node)| layer_location(&self.image, &real, node, &requested)))
    }
}

impl FileResolver for SquashedResolver {
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
        for path in self.tree.paths() {
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
        read_layer_file(&self.image, location, self.max_file_size)
    }

    fn relative_file_by_path(&self, _location: &Location, path: &str) -> Option<Location> {
        self.resolve(path).ok().flatten()
    }

    fn has_path(&self, path: &str) -> bool {
        self.tree.contains(path)
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

    fn two_layer_image() -> Arc<Image> {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("image.tar");
        write_image(
            &archive,
            &[
                layer_tar(&[
                    Item::File("etc/os-release", "ID=alpine\n"),
                    Item::File("opt/app/secret", "s3cr3t"),
                    Item::File("usr/lib/libz.so.1.3", "z"),
                    Item::Symlink("usr/lib/libz.so.1", "libz.so.1.3"),
                ]),
                layer_tar(&[
                    Item::File("etc/os-release", "ID=debian\n"),
                    Item::Whiteout("opt/app/secret"),
                ]),
            ],
        );
        let image = DockerArchiveProvider::new()
            .provide(
                &archive.to_string_lossy(),
                TempDir::new().unwrap(),
                &CancellationToken::new(),
            )
            .unwrap();
        Arc::new(image)
    }

    #[test]
    fn test_upper_layer_wins() {
        let resolver = SquashedResolver::new(two_layer_image());
        let locations = resolver.files_by_path(&["/etc/os-release"]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].layer().unwrap().index, 1);
        assert_eq!(
            resolver.file_contents_string(&locations[0]).unwrap(),
            "ID=debian\n"
        );
    }

    #[test]
    fn test_whiteout_hides_file() {
        let resolver = SquashedResolver::new(two_layer_image());
        assert!(resolver.files_by_path(&["/opt/app/secret"]).unwrap().is_empty());
        assert!(!resolver.has_path("/opt/app/secret"));
        assert!(resolver.has_path("/opt/app"));
    }

    #[test]
    fn test_glob_returns_one_location_per_path() {
        let resolver = SquashedResolver::new(two_layer_image());
        let locations = resolver.files_by_glob(&["**/*"]).unwrap();
        let paths: Vec<&str> = locations.iter().map(|l| l.access_path()).collect();
        assert_eq!(
            paths,
            vec!["/etc/os-release", "/usr/lib/libz.so.1", "/usr/lib/libz.so.1.3"]
        );
    }

    #[test]
    fn test_symlink_virtual_path() {
        let resolver = SquashedResolver::new(two_layer_image());
        let location = resolver
            .relative_file_by_path(&Location::new("/"), "/usr/lib/libz.so.1")
            .unwrap();
        assert_eq!(location.real_path(), "/usr/lib/libz.so.1.3");
        assert_eq!(location.virtual_path(), Some("/usr/lib/libz.so.1"));
        assert_eq!(resolver.file_contents(&location).unwrap(), b"z");
    }
}
