use crate::cataloging::domain::Sbom;
use crate::shared::Result;

/// DocumentEncoder port rendering an [`Sbom`] in one document format
///
/// Encoders read the sbom and never mutate it.
pub trait DocumentEncoder: Send + Sync {
    /// Format identifier as accepted by `--output`, e.g. "spdx-json"
    fn format_id(&self) -> &'static str;

    /// Serializes the sbom into the format's textual representation
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn encode(&self, sbom: &Sbom) -> Result<String>;
}

/// DocumentDecoder port rebuilding an [`Sbom`] from a document
pub trait DocumentDecoder: Send + Sync {
    fn format_id(&self) -> &'static str;

    /// Cheap check whether the bytes look like this decoder's format
    fn identify(&self, document: &[u8]) -> bool;

    /// Parses a document
    ///
    /// # Errors
    /// Returns `DecodeError` for malformed documents and `UnsupportedSchema`
    /// for unknown schema versions; never a partial sbom
    fn decode(&self, document: &[u8]) -> Result<Sbom>;
}
