use super::docker_archive::read_extracted;
use crate::cataloging::domain::{
    clean_path, EntryKind, Image, Layer, LayerEntry, LayerRef, Location,
};
use crate::shared::error::CatalogerError;
use crate::shared::security::{validate_file_size, MAX_LINK_DEPTH};
use crate::shared::Result;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

/// A path in a composed tree together with the layer that last wrote it
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub layer: usize,
    pub entry: LayerEntry,
}

/// FileTree: the filesystem view produced by stacking layers
///
/// Layers are applied bottom-up. Each layer first removes what its opaque
/// markers and whiteouts hide, then writes its own entries, so the topmost
/// writer of a path wins.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileTree {
    nodes: BTreeMap<String, TreeNode>,
}

impl FileTree {
    /// Composes every layer into a single squashed view
    pub fn squash(layers: &[Layer]) -> Self {
        let mut tree = FileTree::default();
        for (index, layer) in layers.iter().enumerate() {
            tree.apply(index, layer);
        }
        tree
    }

    /// The cumulative view after each layer: element `i` is layers `0..=i` squashed
    pub fn per_layer(layers: &[Layer]) -> Vec<Self> {
        let mut trees = Vec::with_capacity(layers.len());
        let mut tree = FileTree::default();
        for (index, layer) in layers.iter().enumerate() {
            tree.apply(index, layer);
            trees.push(tree.clone());
        }
        trees
    }

    pub fn apply(&mut self, index: usize, layer: &Layer) {
        for dir in &layer.opaque_dirs {
            self.remove_children(dir);
        }
        for path in &layer.whiteouts {
            self.nodes.remove(path);
            self.remove_children(path);
        }
        for (path, entry) in &layer.entries {
            self.nodes.insert(
                path.clone(),
                TreeNode {
                    layer: index,
                    entry: entry.clone(),
                },
            );
            self.insert_parents(index, path);
        }
    }

    /// Archives may omit directory entries; parents are implied by their children
    fn insert_parents(&mut self, index: usize, path: &str) {
        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            if parent.is_empty() || self.nodes.contains_key(parent) {
                break;
            }
            self.nodes.insert(
                parent.to_string(),
                TreeNode {
                    layer: index,
                    entry: LayerEntry::directory(),
                },
            );
            current = parent;
        }
    }

    fn remove_children(&mut self, dir: &str) {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        let doomed: Vec<String> = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, _)| path.clone())
            .collect();
        for path in doomed {
            self.nodes.remove(&path);
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = clean_path(path);
        path == "/" || self.nodes.contains_key(&path)
    }

    pub fn node(&self, path: &str) -> Option<&TreeNode> {
        self.nodes.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Resolves every symlink along `path`
    ///
    /// Returns the real path and its node, or None when some component does
    /// not exist. Relative link targets are interpreted against the link's
    /// directory and can never climb above `/`.
    ///
    /// # Errors
    /// Returns an error when more than `MAX_LINK_DEPTH` links are followed
    pub fn resolve(&self, path: &str) -> Result<Option<(String, &TreeNode)>> {
        let mut pending: VecDeque<String> = components(&clean_path(path));
        let mut resolved = String::new();
        let mut hops = 0;

        while let Some(component) = pending.pop_front() {
            let candidate = format!("{}/{}", resolved, component);
            let Some(node) = self.nodes.get(&candidate) else {
                return Ok(None);
            };

            match &node.entry.kind {
                EntryKind::Symlink(target) => {
                    hops += 1;
                    if hops > MAX_LINK_DEPTH {
                        anyhow::bail!(
                            "Too many levels of symbolic links while resolving {}",
                            path
                        );
                    }
                    let target = if target.starts_with('/') {
                        clean_path(target)
                    } else {
                        clean_path(&format!("{}/{}", resolved, target))
                    };
                    let mut restarted = components(&target);
                    restarted.extend(pending.drain(..));
                    pending = restarted;
                    resolved.clear();
                }
                EntryKind::File | EntryKind::Directory => resolved = candidate,
            }
        }

        if resolved.is_empty() {
            return Ok(None);
        }
        Ok(self.nodes.get(&resolved).map(|node| (resolved.clone(), node)))
    }
}

/// Builds the location of a resolved node, tagged with the layer that wrote it
pub(crate) fn layer_location(
    image: &Image,
    real_path: &str,
    node: &TreeNode,
    requested: &str,
) -> Location {
    let digest = image
        .layers()
        .get(node.layer)
        .map(|l| l.metadata.digest.clone())
        .unwrap_or_default();
    Location::new(real_path)
        .with_virtual_path(requested)
        .in_layer(LayerRef::new(node.layer, digest))
}

/// Reads a file body out of the layer recorded in its location
pub(crate) fn read_layer_file(
    image: &Image,
    location: &Location,
    max_file_size: u64,
) -> Result<Vec<u8>> {
    let not_found = |details: &str| CatalogerError::FileReadError {
        path: PathBuf::from(location.real_path()),
        details: details.to_string(),
    };

    let layer = location
        .layer()
        .and_then(|layer| image.layers().get(layer.index))
        .ok_or_else(|| not_found("location does not belong to this image"))?;
    let entry = layer
        .entries
        .get(location.real_path())
        .ok_or_else(|| not_found("path not present in layer"))?;
    let content = entry
        .content
        .as_ref()
        .ok_or_else(|| not_found("not a regular file"))?;

    validate_file_size(entry.size, &PathBuf::from(location.real_path()), max_file_size)?;
    read_extracted(content).map_err(|e| not_found(&e.to_string()).into())
}

fn components(path: &str) -> VecDeque<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cataloging::domain::LayerMetadata;
    use std::path::PathBuf;

    fn layer(index: usize) -> Layer {
        Layer::new(LayerMetadata {
            index,
            digest: format!("sha256:layer{}", index),
            ..Default::default()
        })
    }

    fn file(name: &str) -> LayerEntry {
        LayerEntry::file(1, PathBuf::from(name))
    }

    #[test]
    fn test_squash_last_writer_wins() {
        let mut lower = layer(0);
        lower.entries.insert("/etc/motd".to_string(), file("a"));
        let mut upper = layer(1);
        upper.entries.insert("/etc/motd".to_string(), file("b"));

        let tree = FileTree::squash(&[lower, upper]);
        assert_eq!(tree.node("/etc/motd").unwrap().layer, 1);
        assert!(tree.node("/etc").unwrap().entry.is_dir());
    }

    #[test]
    fn test_whiteout_removes_file_and_children() {
        let mut lower = layer(0);
        lower.entries.insert("/opt/app/bin".to_string(), file("a"));
        lower.entries.insert("/etc/motd".to_string(), file("b"));
        let mut upper = layer(1);
        upper.whiteouts.insert("/opt/app".to_string());

        let tree = FileTree::squash(&[lower, upper]);
        assert!(!tree.contains("/opt/app"));
        assert!(!tree.contains("/opt/app/bin"));
        assert!(tree.contains("/opt"));
        assert!(tree.contains("/etc/motd"));
    }

    #[test]
    fn test_opaque_directory_hides_lower_contents() {
        let mut lower = layer(0);
        lower.entries.insert("/var/cache/old".to_string(), file("a"));
        let mut upper = layer(1);
        upper.opaque_dirs.insert("/var/cache".to_string());
        upper.entries.insert("/var/cache/new".to_string(), file("b"));

        let tree = FileTree::squash(&[lower, upper]);
        assert!(tree.contains("/var/cache"));
        assert!(!tree.contains("/var/cache/old"));
        assert!(tree.contains("/var/cache/new"));
    }

    #[test]
    fn test_per_layer_keeps_deleted_files_in_lower_views() {
        let mut lower = layer(0);
        lower.entries.insert("/etc/motd".to_string(), file("a"));
        let mut upper = layer(1);
        upper.whiteouts.insert("/etc/motd".to_string());

        let trees = FileTree::per_layer(&[lower, upper]);
        assert!(trees[0].contains("/etc/motd"));
        assert!(!trees[1].contains("/etc/motd"));
    }

    #[test]
    fn test_resolve_follows_relative_and_absolute_links() {
        let mut base = layer(0);
        base.entries.insert("/usr/lib/libz.so.1.3".to_string(), file("z"));
        base.entries
            .insert("/usr/lib/libz.so.1".to_string(), LayerEntry::symlink("libz.so.1.3"));
        base.entries.insert("/lib".to_string(), LayerEntry::symlink("/usr/lib"));

        let tree = FileTree::squash(&[base]);
        let (real, node) = tree.resolve("/lib/libz.so.1").unwrap().unwrap();
        assert_eq!(real, "/usr/lib/libz.so.1.3");
        assert_eq!(node.entry.kind, EntryKind::File);
    }

    #[test]
    fn test_resolve_missing_and_root() {
        let tree = FileTree::squash(&[layer(0)]);
        assert!(tree.resolve("/nope").unwrap().is_none());
        assert!(tree.resolve("/").unwrap().is_none());
    }

    #[test]
    fn test_resolve_link_loop_fails() {
        let mut base = layer(0);
        base.entries.insert("/a".to_string(), LayerEntry::symlink("/b"));
        base.entries.insert("/b".to_string(), LayerEntry::symlink("/a"));

        let tree = FileTree::squash(&[base]);
        assert!(tree
            .resolve("/a")
            .unwrap_err()
            .to_string()
            .contains("Too many levels"));
    }
}
