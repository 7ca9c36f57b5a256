use crate::adapters::outbound::filesystem::DirectoryResolver;
use crate::adapters::outbound::image::{AllLayersResolver, DockerArchiveProvider, SquashedResolver};
use crate::cataloging::domain::{Image, Scope, SourceMetadata};
use crate::ports::outbound::{FileResolver, ImageProvider};
use crate::shared::error::CatalogerError;
use crate::shared::security::MAX_FILE_SIZE;
use crate::shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DIR_PREFIX: &str = "dir:";
const REGISTRY_SCHEME: &str = "registry";
const IMAGE_SCHEMES: [&str; 3] = [DockerArchiveProvider::SCHEME, REGISTRY_SCHEME, "docker"];
const WORKSPACE_PREFIX: &str = "sbom-cataloger-";

/// Options controlling how a [`Source`] is opened
#[derive(Clone)]
pub struct SourceOptions {
    /// Image providers by scheme; the docker archive provider is always present by default
    pub providers: Vec<Arc<dyn ImageProvider>>,
    pub cancel: CancellationToken,
    /// Parent directory for image workspaces (system temp dir when unset)
    pub work_dir: Option<PathBuf>,
    pub max_file_size: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            providers: vec![Arc::new(DockerArchiveProvider::new())],
            cancel: CancellationToken::new(),
            work_dir: None,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl std::fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schemes: Vec<&str> = self.providers.iter().map(|p| p.scheme()).collect();
        f.debug_struct("SourceOptions")
            .field("providers", &schemes)
            .field("work_dir", &self.work_dir)
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

/// What the user input refers to, before anything is opened
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceInput {
    Directory(String),
    Image { scheme: String, reference: String },
}

impl SourceInput {
    fn parse(input: &str) -> Self {
        if let Some(path) = input.strip_prefix(DIR_PREFIX) {
            return SourceInput::Directory(path.to_string());
        }
        for scheme in IMAGE_SCHEMES {
            if let Some(reference) = input
                .strip_prefix(scheme)
                .and_then(|rest| rest.strip_prefix(':'))
            {
                return SourceInput::Image {
                    scheme: scheme.to_string(),
                    reference: reference.to_string(),
                };
            }
        }

        let path = Path::new(input);
        if path.is_dir() {
            SourceInput::Directory(input.to_string())
        } else if path.is_file() && input.ends_with(".tar") {
            SourceInput::Image {
                scheme: DockerArchiveProvider::SCHEME.to_string(),
                reference: input.to_string(),
            }
        } else {
            SourceInput::Image {
                scheme: REGISTRY_SCHEME.to_string(),
                reference: input.to_string(),
            }
        }
    }
}

#[derive(Debug)]
enum Backing {
    Directory(PathBuf),
    Image(Arc<Image>),
}

/// Source: the cataloging target, opened once per run
///
/// An image source owns its materialized workspace; dropping the source
/// (and every resolver created from it) removes the workspace.
#[derive(Debug)]
pub struct Source {
    metadata: SourceMetadata,
    backing: Backing,
    max_file_size: u64,
}

impl Source {
    /// Opens the source named by `input`
    ///
    /// Image materialization is blocking I/O; async callers should run this
    /// on a blocking thread.
    ///
    /// # Errors
    /// Returns `SourceUnavailable` when the input cannot be opened and
    /// `Cancelled` when the token fires during image extraction
    pub fn new(input: &str, options: &SourceOptions) -> Result<Self> {
        if options.cancel.is_cancelled() {
            return Err(CatalogerError::Cancelled {
                operation: "source resolution".to_string(),
            }
            .into());
        }

        match SourceInput::parse(input) {
            SourceInput::Directory(path) => Self::open_directory(input, &path, options),
            SourceInput::Image { scheme, reference } => {
                Self::open_image(input, &scheme, &reference, options)
            }
        }
    }

    fn open_directory(input: &str, path: &str, options: &SourceOptions) -> Result<Self> {
        let root = Path::new(path);
        if !root.is_dir() {
            return Err(CatalogerError::SourceUnavailable {
                input: input.to_string(),
                reason: "path does not exist or is not a directory".to_string(),
            }
            .into());
        }
        tracing::debug!(path = %path, "opened directory source");
        Ok(Self {
            metadata: SourceMetadata::directory(path),
            backing: Backing::Directory(root.to_path_buf()),
            max_file_size: options.max_file_size,
        })
    }

    fn open_image(
        input: &str,
        scheme: &str,
        reference: &str,
        options: &SourceOptions,
    ) -> Result<Self> {
        let provider = options
            .providers
            .iter()
            .find(|p| p.scheme() == scheme)
            .ok_or_else(|| CatalogerError::SourceUnavailable {
                input: input.to_string(),
                reason: format!("no image provider registered for scheme '{}'", scheme),
            })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match &options.work_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(|e| CatalogerError::SourceUnavailable {
            input: input.to_string(),
            reason: format!("cannot create image workspace: {}", e),
        })?;

        tracing::info!(scheme = %scheme, reference = %reference, "materializing image");
        let image = provider.provide(reference, workspace, &options.cancel)?;
        tracing::debug!(
            layers = image.layers().len(),
            workspace = %image.workspace().display(),
            "image materialized"
        );

        Ok(Self {
            metadata: SourceMetadata::Image(image.metadata().clone()),
            backing: Backing::Image(Arc::new(image)),
            max_file_size: options.max_file_size,
        })
    }

    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// Creates a resolver over this source for `scope`
    ///
    /// Directories ignore the scope. Images require `Squashed` or
    /// `AllLayers`.
    ///
    /// # Errors
    /// Returns `InvalidScope` for any other scope on an image source
    pub fn file_resolver(&self, scope: Scope) -> Result<Arc<dyn FileResolver>> {
        match &self.backing {
            Backing::Directory(root) => Ok(Arc::new(
                DirectoryResolver::new(root)?.with_max_file_size(self.max_file_size),
            )),
            Backing::Image(image) => match scope {
                Scope::Squashed => Ok(Arc::new(
                    SquashedResolver::new(Arc::clone(image))
                        .with_max_file_size(self.max_file_size),
                )),
                Scope::AllLayers => Ok(Arc::new(
                    AllLayersResolver::new(Arc::clone(image))
                        .with_max_file_size(self.max_file_size),
                )),
                Scope::Unspecified => Err(CatalogerError::InvalidScope {
                    scope: scope.to_string(),
                    scheme: self.metadata.scheme().to_string(),
                }
                .into()),
            },
        }
    }
}
