use crate::cataloging::domain::Image;
use crate::shared::Result;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// ImageProvider port materializing a container image into a workspace
///
/// The provider takes ownership of the workspace. On success it moves into
/// the returned [`Image`]; on failure it is dropped and removed together
/// with anything already extracted.
pub trait ImageProvider: Send + Sync {
    /// Input scheme served by this provider, e.g. "docker-archive"
    fn scheme(&self) -> &str;

    /// Fetches and extracts the image identified by `reference`
    ///
    /// # Errors
    /// Returns an error if the image cannot be read, or `Cancelled` when the
    /// token fires between layers or entries
    fn provide(
        &self,
        reference: &str,
        workspace: TempDir,
        cancel: &CancellationToken,
    ) -> Result<Image>;
}
