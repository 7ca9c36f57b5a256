use crate::shared::Result;

/// OutputPresenter port delivering an encoded document
///
/// Implementations decide the destination (stdout or a file); the
/// document is passed through unchanged.
pub trait OutputPresenter {
    /// Writes the document to the destination
    ///
    /// # Errors
    /// Returns `FileWriteError` when the destination cannot be written
    fn present(&self, content: &str) -> Result<()>;
}
