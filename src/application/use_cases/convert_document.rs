use crate::application::dto::OutputFormat;
use crate::application::factories::FormatFactory;
use crate::ports::inbound::ConversionPort;
use crate::ports::outbound::ProgressReporter;
use crate::shared::Result;

/// ConvertDocumentUseCase - Re-encodes an existing document in another format
///
/// The input format is detected from the document itself.
pub struct ConvertDocumentUseCase<PR> {
    progress_reporter: PR,
}

impl<PR: ProgressReporter> ConvertDocumentUseCase<PR> {
    pub fn new(progress_reporter: PR) -> Self {
        Self { progress_reporter }
    }
}

impl<PR: ProgressReporter> ConversionPort for ConvertDocumentUseCase<PR> {
    fn convert(&self, document: &[u8], target: OutputFormat) -> Result<String> {
        self.progress_reporter.report("📖 Decoding document...");
        let sbom = FormatFactory::decode_any(document)?;
        tracing::debug!(
            packages = sbom.catalog().len(),
            relationships = sbom.relationships().len(),
            "document decoded"
        );

        self.progress_reporter
            .report(FormatFactory::progress_message(target));
        let encoded = FormatFactory::encoder(target).encode(&sbom)?;
        self.progress_reporter.report_completion(&format!(
            "✅ Converted {} package(s) to {}",
            sbom.catalog().len(),
            target
        ));
        Ok(encoded)
    }
}
