use crate::application::dto::{CatalogRequest, CatalogResponse};
use crate::shared::Result;
use async_trait::async_trait;

/// CatalogingPort - Inbound port for cataloging a source
///
/// This port defines the interface that external adapters (CLI, API, etc.)
/// use to trigger cataloging. It represents the application's public API.
#[async_trait]
pub trait CatalogingPort: Send + Sync {
    /// Catalogs the source named in the request and encodes the result
    ///
    /// # Errors
    /// Returns an error if:
    /// - The source cannot be opened (`SourceUnavailable`)
    /// - The scope does not apply to the source (`InvalidScope`)
    /// - The run is cancelled (`Cancelled`)
    /// - Encoding the requested format fails
    ///
    /// Individual analyzer failures are not errors; they are reported as
    /// warnings in the response.
    async fn catalog(&self, request: CatalogRequest) -> Result<CatalogResponse>;
}
