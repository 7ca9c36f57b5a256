//! On-disk fixtures built per test: root filesystems and `docker save` archives.

use std::fs;
use std::path::Path;

pub const OS_RELEASE: &str = "\
PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"
NAME=\"Debian GNU/Linux\"
VERSION_ID=\"12\"
ID=debian
";

pub const DPKG_STATUS: &str = "\
Package: libc6
Status: install ok installed
Architecture: amd64
Version: 2.36-9+deb12u4
Description: GNU C Library: Shared libraries

Package: python3-six
Status: install ok installed
Architecture: all
Version: 1.16.0-4
";

pub const SIX_METADATA: &str = "\
Metadata-Version: 2.1
Name: six
Version: 1.16.0
Author: Benjamin Peterson
License: MIT
";

pub const REQUESTS_METADATA: &str = "\
Metadata-Version: 2.1
Name: requests
Version: 2.31.0
License: Apache 2.0
";

pub const SITE_PACKAGES: &str = "usr/lib/python3/dist-packages";

/// Writes a small Debian root filesystem with two dpkg packages and one
/// python distribution owned by `python3-six`
pub fn write_rootfs(root: &Path) {
    write(root, "etc/os-release", OS_RELEASE);
    write(root, "var/lib/dpkg/status", DPKG_STATUS);
    write(
        root,
        "var/lib/dpkg/info/python3-six.list",
        &format!("/{}/six-1.16.0.dist-info/METADATA\n", SITE_PACKAGES),
    );
    write(
        root,
        &format!("{}/six-1.16.0.dist-info/METADATA", SITE_PACKAGES),
        SIX_METADATA,
    );
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Builder for one image layer tarball
#[derive(Default)]
pub struct LayerBuilder {
    builder: Option<tar::Builder<Vec<u8>>>,
}

impl LayerBuilder {
    pub fn new() -> Self {
        Self {
            builder: Some(tar::Builder::new(Vec::new())),
        }
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.append(path, content.as_bytes());
        self
    }

    /// Deletes `path` from lower layers with an AUFS whiteout marker
    pub fn whiteout(mut self, path: &str) -> Self {
        let marker = match path.rsplit_once('/') {
            Some((dir, name)) => format!("{}/.wh.{}", dir, name),
            None => format!(".wh.{}", path),
        };
        self.append(&marker, &[]);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.builder
            .take()
            .unwrap_or_else(|| tar::Builder::new(Vec::new()))
            .into_inner()
            .unwrap()
    }

    fn append(&mut self, path: &str, content: &[u8]) {
        let builder = self
            .builder
            .get_or_insert_with(|| tar::Builder::new(Vec::new()));
        append_entry(builder, path, content);
    }
}

fn append_entry(builder: &mut tar::Builder<Vec<u8>>, path: &str, content: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_size(content.len() as u64);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, path, content).unwrap();
}

/// Writes a `docker save` archive holding `layers`, lowest first
pub fn write_docker_archive(path: &Path, layers: &[Vec<u8>]) {
    let mut builder = tar::Builder::new(Vec::new());
    let mut layer_paths = Vec::new();
    let mut diff_ids = Vec::new();
    for (index, layer) in layers.iter().enumerate() {
        let layer_path = format!("{:02}/layer.tar", index);
        append_entry(&mut builder, &layer_path, layer);
        layer_paths.push(layer_path);
        diff_ids.push(format!("sha256:{:064x}", 0xa0 + index));
    }

    let config = serde_json::json!({
        "architecture": "amd64",
        "os": "linux",
        "rootfs": { "type": "layers", "diff_ids": diff_ids },
    });
    append_entry(&mut builder, "config.json", config.to_string().as_bytes());

    let manifest = serde_json::json!([{
        "Config": "config.json",
        "RepoTags": ["example/app:1.0"],
        "Layers": layer_paths,
    }]);
    append_entry(&mut builder, "manifest.json", manifest.to_string().as_bytes());

    fs::write(path, builder.into_inner().unwrap()).unwrap();
}

/// A two-layer image: the lower layer installs `six` and `requests`, the
/// upper layer deletes the `requests` metadata with a whiteout
pub fn write_two_layer_image(path: &Path) {
    let lower = LayerBuilder::new()
        .file("etc/os-release", OS_RELEASE)
        .file(
            &format!("{}/six-1.16.0.dist-info/METADATA", SITE_PACKAGES),
            SIX_METADATA,
        )
        .file(
            &format!("{}/requests-2.31.0.dist-info/METADATA", SITE_PACKAGES),
            REQUESTS_METADATA,
        )
        .build();
    let upper = LayerBuilder::new()
        .whiteout(&format!(
            "{}/requests-2.31.0.dist-info/METADATA",
            SITE_PACKAGES
        ))
        .file("app/main.py", "print('hello')\n")
        .build();
    write_docker_archive(path, &[lower, upper]);
}
