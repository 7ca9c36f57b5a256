use crate::adapters::outbound::formats::{CycloneDxJsonFormat, NativeJsonFormat, SpdxJsonFormat};
use crate::application::dto::OutputFormat;
use crate::cataloging::domain::Sbom;
use crate::ports::outbound::{DocumentDecoder, DocumentEncoder};
use crate::shared::error::CatalogerError;
use crate::shared::Result;

/// Factory for creating document encoders and decoders
///
/// This factory encapsulates the selection of format adapters, following
/// the Factory Pattern. It belongs in the application layer as it
/// orchestrates the selection of infrastructure adapters based on
/// application needs.
pub struct FormatFactory;

impl FormatFactory {
    /// Creates an encoder for the specified output format
    ///
    /// # Examples
    /// ```
    /// use sbom_cataloger::application::dto::OutputFormat;
    /// use sbom_cataloger::application::factories::FormatFactory;
    ///
    /// let encoder = FormatFactory::encoder(OutputFormat::SpdxJson);
    /// assert_eq!(encoder.format_id(), "spdx-json");
    /// ```
    pub fn encoder(format: OutputFormat) -> Box<dyn DocumentEncoder> {
        match format {
            OutputFormat::Json => Box::new(NativeJsonFormat::new()),
            OutputFormat::SpdxJson => Box::new(SpdxJsonFormat::new()),
            OutputFormat::CycloneDxJson => Box::new(CycloneDxJsonFormat::new()),
        }
    }

    /// Creates a decoder for the specified format, if it can be decoded
    pub fn decoder(format: OutputFormat) -> Option<Box<dyn DocumentDecoder>> {
        match format {
            OutputFormat::Json => Some(Box::new(NativeJsonFormat::new())),
            OutputFormat::SpdxJson => Some(Box::new(SpdxJsonFormat::new())),
            OutputFormat::CycloneDxJson => None,
        }
    }

    /// Every available decoder, in detection order
    pub fn decoders() -> Vec<Box<dyn DocumentDecoder>> {
        vec![
            Box::new(NativeJsonFormat::new()),
            Box::new(SpdxJsonFormat::new()),
        ]
    }

    /// Decodes a document in any supported format
    ///
    /// # Errors
    /// Returns `DecodeError` when no decoder recognizes the document, or
    /// whatever the recognizing decoder reports
    pub fn decode_any(document: &[u8]) -> Result<Sbom> {
        let decoder = Self::decoders()
            .into_iter()
            .find(|d| d.identify(document))
            .ok_or_else(|| {
                CatalogerError::decode("document", "not a recognized sbom document format")
            })?;
        tracing::debug!(format = decoder.format_id(), "detected document format");
        decoder.decode(document)
    }

    /// Returns the progress message for the specified output format
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Generating native JSON output...",
            OutputFormat::SpdxJson => "📝 Generating SPDX 2.3 JSON output...",
            OutputFormat::CycloneDxJson => "📝 Generating CycloneDX 1.6 JSON output...",
        }
    }
}
