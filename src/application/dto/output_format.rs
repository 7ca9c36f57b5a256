/// Output format enumeration for encoded documents
///
/// This enum represents the supported document formats. It belongs in the
/// application layer as both the CLI (inbound adapter) and the format
/// adapters (outbound) need to understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Native JSON format (default, lossless)
    #[default]
    Json,
    /// SPDX 2.3 JSON
    SpdxJson,
    /// CycloneDX 1.6 JSON (encode only)
    CycloneDxJson,
}

impl OutputFormat {
    /// Identifier as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::SpdxJson => "spdx-json",
            OutputFormat::CycloneDxJson => "cyclonedx-json",
        }
    }

    /// Whether documents in this format can be decoded again
    pub fn is_decodable(&self) -> bool {
        !matches!(self, OutputFormat::CycloneDxJson)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "spdx-json" | "spdx" => Ok(OutputFormat::SpdxJson),
            "cyclonedx-json" | "cyclonedx" | "cdx" => Ok(OutputFormat::CycloneDxJson),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'json', 'spdx-json' or 'cyclonedx-json'",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
