/// Document format adapters: native JSON, SPDX and CycloneDX
mod cyclonedx_json;
mod native_json;
mod spdx_json;

pub use cyclonedx_json::CycloneDxJsonFormat;
pub use native_json::{NativeJsonFormat, SCHEMA_VERSION};
pub use spdx_json::SpdxJsonFormat;

use crate::shared::error::CatalogerError;
use crate::shared::Result;

/// Parses raw bytes as JSON, reporting syntax errors as a decode failure
pub(crate) fn parse_json(document: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(document)
        .map_err(|e| CatalogerError::decode("document", e.to_string()).into())
}
