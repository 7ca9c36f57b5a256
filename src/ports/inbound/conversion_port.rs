use crate::application::dto::OutputFormat;
use crate::shared::Result;

/// ConversionPort - Inbound port for re-encoding an existing document
pub trait ConversionPort {
    /// Decodes `document` in whatever supported format it is in and encodes
    /// it as `target`
    ///
    /// # Errors
    /// Returns `DecodeError` or `UnsupportedSchema` when the document cannot
    /// be read, or an error when `target` cannot be encoded
    fn convert(&self, document: &[u8], target: OutputFormat) -> Result<String>;
}
