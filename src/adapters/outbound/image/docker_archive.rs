use crate::cataloging::domain::{
    clean_path, Image, ImageMetadata, Layer, LayerEntry, LayerMetadata,
};
use crate::ports::outbound::ImageProvider;
use crate::shared::error::CatalogerError;
use crate::shared::security::validate_within_root;
use crate::shared::Result;
use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const WHITEOUT_PREFIX: &str = ".wh.";
const OPAQUE_MARKER: &str = ".wh..wh..opq";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MANIFEST_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";
const LAYER_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar";

/// One entry of a `docker save` manifest.json
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ManifestEntry {
    config: String,
    #[serde(default)]
    repo_tags: Option<Vec<String>>,
    layers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageConfig {
    #[serde(default)]
    rootfs: RootFs,
}

#[derive(Debug, Default, Deserialize)]
struct RootFs {
    #[serde(default)]
    diff_ids: Vec<String>,
}

/// DockerArchiveProvider adapter reading images produced by `docker save`
///
/// The outer archive is unpacked into `<workspace>/archive`; every layer's
/// regular files are then extracted into `<workspace>/layers/<index>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DockerArchiveProvider;

impl DockerArchiveProvider {
    pub const SCHEME: &'static str = "docker-archive";

    pub fn new() -> Self {
        Self
    }

    fn load(
        &self,
        reference: &str,
        workspace: &Path,
        cancel: &CancellationToken,
    ) -> Result<(ImageMetadata, Vec<Layer>)> {
        let archive_dir = workspace.join("archive");
        fs::create_dir_all(&archive_dir)?;
        let archive_dir = archive_dir.canonicalize()?;
        unpack_outer_archive(Path::new(reference), &archive_dir)?;
        check_cancelled(cancel)?;

        let manifest_bytes = fs::read(archive_dir.join("manifest.json"))
            .map_err(|e| anyhow::anyhow!("manifest.json not readable: {}", e))?;
        let manifest: Vec<ManifestEntry> = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| anyhow::anyhow!("manifest.json is malformed: {}", e))?;
        let entry = manifest
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("manifest.json lists no images"))?;

        let config_path = archive_member(&archive_dir, &entry.config)?;
        let config_bytes = fs::read(&config_path)
            .map_err(|e| anyhow::anyhow!("image config {} not readable: {}", entry.config, e))?;
        let config: ImageConfig = serde_json::from_slice(&config_bytes)
            .map_err(|e| anyhow::anyhow!("image config {} is malformed: {}", entry.config, e))?;

        let mut layers = Vec::with_capacity(entry.layers.len());
        for (index, layer_path) in entry.layers.iter().enumerate() {
            check_cancelled(cancel)?;

            let layer_file = archive_member(&archive_dir, layer_path)?;
            let digest = match config.rootfs.diff_ids.get(index) {
                Some(diff_id) => diff_id.clone(),
                None => {
                    tracing::warn!(
                        layer = index,
                        path = %layer_path,
                        "image config has no diff_id for layer, using the tarball digest"
                    );
                    file_digest(&layer_file)?
                }
            };
            let size = fs::metadata(&layer_file)?.len();
            let metadata = LayerMetadata {
                index,
                digest,
                media_type: LAYER_MEDIA_TYPE.to_string(),
                size,
            };

            let target = workspace.join("layers").join(index.to_string());
            fs::create_dir_all(&target)?;
            let layer = read_layer(&layer_file, metadata, &target, cancel)?;
            tracing::debug!(
                layer = index,
                digest = %layer.metadata.digest,
                entries = layer.entries.len(),
                whiteouts = layer.whiteouts.len(),
                "extracted layer"
            );
            layers.push(layer);
        }

        let metadata = ImageMetadata {
            user_input: reference.to_string(),
            id: format!("sha256:{}", hex::encode(Sha256::digest(&config_bytes))),
            manifest_digest: format!("sha256:{}", hex::encode(Sha256::digest(&manifest_bytes))),
            media_type: MANIFEST_MEDIA_TYPE.to_string(),
            tags: entry.repo_tags.unwrap_or_default(),
            size: layers.iter().map(|l| l.metadata.size).sum(),
            layers: layers.iter().map(|l| l.metadata.clone()).collect(),
        };
        Ok((metadata, layers))
    }
}

impl ImageProvider for DockerArchiveProvider {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    fn provide(
        &self,
        reference: &str,
        workspace: TempDir,
        cancel: &CancellationToken,
    ) -> Result<Image> {
        match self.load(reference, workspace.path(), cancel) {
            Ok((metadata, layers)) => Ok(Image::new(metadata, layers, workspace)),
            Err(e) if is_cancelled(&e) => Err(e),
            Err(e) => Err(CatalogerError::SourceUnavailable {
                input: format!("{}:{}", Self::SCHEME, reference),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(CatalogerError::Cancelled {
            operation: "image extraction".to_string(),
        }
        .into());
    }
    Ok(())
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<CatalogerError>(),
        Some(CatalogerError::Cancelled { .. })
    )
}

/// Opens a possibly gzip-compressed tar stream
fn open_tar(path: &Path) -> Result<tar::Archive<Box<dyn Read>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut magic = [0u8; 2];
    let read = reader.read(&mut magic)?;
    let head = io::Cursor::new(magic[..read].to_vec());
    let chained = head.chain(reader);

    let stream: Box<dyn Read> = if read == 2 && magic == GZIP_MAGIC {
        Box::new(GzDecoder::new(chained))
    } else {
        Box::new(chained)
    };
    Ok(tar::Archive::new(stream))
}

fn unpack_outer_archive(archive: &Path, target: &Path) -> Result<()> {
    let mut archive = open_tar(archive)?;
    for entry in archive.entries()? {
        let mut entry = entry?;
        // unpack_in refuses paths that would land outside of the target
        entry.unpack_in(target)?;
    }
    Ok(())
}

/// Resolves a file named by manifest.json, which must stay inside the unpacked archive
fn archive_member(archive_dir: &Path, name: &str) -> Result<PathBuf> {
    validate_within_root(archive_dir, &archive_dir.join(name))
}

fn file_digest(path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// Reads one layer tarball into its entry table
fn read_layer(
    layer_file: &Path,
    metadata: LayerMetadata,
    target: &Path,
    cancel: &CancellationToken,
) -> Result<Layer> {
    let mut layer = Layer::new(metadata);
    let mut archive = open_tar(layer_file)?;
    let mut extracted = 0usize;

    for entry in archive.entries()? {
        check_cancelled(cancel)?;
        let mut entry = entry?;
        let path = clean_path(&entry.path()?.to_string_lossy());
        let (parent, name) = split_parent(&path);

        if name == OPAQUE_MARKER {
            layer.opaque_dirs.insert(parent.to_string());
            continue;
        }
        if let Some(hidden) = name.strip_prefix(WHITEOUT_PREFIX) {
            layer.whiteouts.insert(join(parent, hidden));
            continue;
        }

        let entry_type = entry.header().entry_type();
        let layer_entry = if entry_type.is_dir() {
            LayerEntry::directory()
        } else if entry_type.is_symlink() {
            match entry.link_name()? {
                Some(target) => LayerEntry::symlink(target.to_string_lossy()),
                None => continue,
            }
        } else if entry_type.is_hard_link() {
            // Hard links share the body of an earlier entry of the same layer
            let Some(link) = entry.link_name()? else {
                continue;
            };
            match layer.entries.get(&clean_path(&link.to_string_lossy())) {
                Some(existing) => existing.clone(),
                None => continue,
            }
        } else if entry_type.is_file() {
            let content = target.join(extracted.to_string());
            extracted += 1;
            let mut out = File::create(&content)?;
            let size = io::copy(&mut entry, &mut out)?;
            LayerEntry::file(size, content)
        } else {
            continue;
        };

        layer.entries.insert(path, layer_entry);
    }

    Ok(layer)
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((parent, name)) => (parent, name),
        None => ("/", path),
    }
}

fn join(parent: &str, name: &str) -> String {
    clean_path(&format!("{}/{}", parent, name))
}

/// Reads the extracted body of a layer entry
pub(crate) fn read_extracted(content: &Path) -> io::Result<Vec<u8>> {
    fs::read(content)
}
