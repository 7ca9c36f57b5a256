use crate::cataloging::domain::Sbom;
use crate::shared::error::CatalogerError;

/// CatalogResponse - Internal response DTO from the cataloging use case
///
/// The catalog is best effort: analyzer failures and duplicate-identity
/// conflicts are collected as warnings next to the encoded document.
#[derive(Debug)]
pub struct CatalogResponse {
    /// The finalized sbom the document was encoded from
    pub sbom: Sbom,
    /// The encoded document in the requested format
    pub document: String,
    /// `AnalyzerFailure` and `DuplicateIdentityConflict` observations
    pub warnings: Vec<CatalogerError>,
}

impl CatalogResponse {
    pub fn new(sbom: Sbom, document: String, warnings: Vec<CatalogerError>) -> Self {
        Self {
            sbom,
            document,
            warnings,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
