use serde::{Deserialize, Serialize};

/// Ecosystem-specific payload attached to a package
///
/// A closed set of shapes keyed by a type name. Encoders match on the variant
/// instead of inspecting the payload dynamically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageMetadata {
    #[default]
    None,
    Python(PythonMetadata),
    Dpkg(DpkgMetadata),
}

impl PackageMetadata {
    pub const PYTHON_TYPE: &'static str = "PythonPackageMetadata";
    pub const DPKG_TYPE: &'static str = "DpkgMetadata";

    /// Type name written next to the payload in documents; empty for `None`
    pub fn type_name(&self) -> &'static str {
        match self {
            PackageMetadata::None => "",
            PackageMetadata::Python(_) => Self::PYTHON_TYPE,
            PackageMetadata::Dpkg(_) => Self::DPKG_TYPE,
        }
    }

    /// Files this package declares as installed by it
    pub fn owned_files(&self) -> Vec<&str> {
        match self {
            PackageMetadata::None => Vec::new(),
            PackageMetadata::Python(m) => m.files.iter().map(|f| f.path.as_str()).collect(),
            PackageMetadata::Dpkg(m) => m.files.iter().map(|f| f.path.as_str()).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            PackageMetadata::None => Ok(serde_json::Value::Null),
            PackageMetadata::Python(m) => serde_json::to_value(m),
            PackageMetadata::Dpkg(m) => serde_json::to_value(m),
        };
        // Plain structs of strings and integers always serialize
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Rebuilds a payload from its type name and JSON body
    pub fn from_json(type_name: &str, value: serde_json::Value) -> Result<Self, String> {
        match type_name {
            "" => Ok(PackageMetadata::None),
            Self::PYTHON_TYPE => serde_json::from_value(value)
                .map(PackageMetadata::Python)
                .map_err(|e| e.to_string()),
            Self::DPKG_TYPE => serde_json::from_value(value)
                .map(PackageMetadata::Dpkg)
                .map_err(|e| e.to_string()),
            other => Err(format!("unknown metadata type: {}", other)),
        }
    }
}

/// Metadata read from a Python distribution's METADATA / PKG-INFO and RECORD
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PythonMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_packages_root_path: Option<String>,
    #[serde(default)]
    pub files: Vec<PythonFileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PythonFileRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Metadata read from a dpkg status database entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpkgMetadata {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub version: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<u64>,
    #[serde(default)]
    pub files: Vec<DpkgFileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpkgFileRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}
