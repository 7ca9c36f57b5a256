/// ToolDescriptor value object identifying the tool that produced a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    name: String,
    version: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Descriptor for this build, using the compile-time version from Cargo.toml
    pub fn current() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Linux distribution detected in a source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Distro {
    /// os-release `ID`, e.g. "debian"
    pub name: String,
    /// os-release `VERSION_ID`, e.g. "12"
    pub version: String,
    pub id_like: Vec<String>,
    pub pretty_name: Option<String>,
}
