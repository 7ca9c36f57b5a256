use super::identity::content_id;
use super::{Licenses, Location, LocationSet, PackageMetadata, PackageType};
use crate::shared::Result;
use std::fmt;

/// Maximum length for package names (security limit)
const MAX_PACKAGE_NAME_LENGTH: usize = 512;

/// Maximum length for package versions (security limit)
const MAX_VERSION_LENGTH: usize = 256;

/// Content-addressed package identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(String);

impl PackageId {
    /// Wraps an already computed identifier
    pub fn from_hex(id: impl Into<String>) -> Self {
        PackageId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Package entity: one logical package observed in a source
///
/// The id is derived from name, version, type and metadata only, so
/// independent observations of the same package collapse onto one id no
/// matter which analyzer produced them or where they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    id: PackageId,
    name: String,
    version: String,
    package_type: PackageType,
    found_by: String,
    locations: LocationSet,
    licenses: Licenses,
    language: Option<String>,
    purl: Option<String>,
    cpes: Vec<String>,
    metadata: PackageMetadata,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        package_type: PackageType,
    ) -> Result<Self> {
        let name = validate_name(name.into())?;
        let version = validate_version(version.into())?;
        let metadata = PackageMetadata::None;
        let id = compute_id(&name, &version, package_type, &metadata);

        Ok(Self {
            id,
            name,
            version,
            package_type,
            found_by: String::new(),
            locations: LocationSet::new(),
            licenses: Licenses::NotFound,
            language: package_type.language().map(str::to_string),
            purl: None,
            cpes: Vec::new(),
            metadata,
        })
    }

    pub fn with_found_by(mut self, analyzer: impl Into<String>) -> Self {
        self.found_by = analyzer.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location);
        self
    }

    pub fn with_locations<I: IntoIterator<Item = Location>>(mut self, locations: I) -> Self {
        self.locations.extend(locations);
        self
    }

    pub fn with_licenses(mut self, licenses: Licenses) -> Self {
        self.licenses = licenses;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = Some(purl.into());
        self
    }

    pub fn with_cpes(mut self, cpes: Vec<String>) -> Self {
        self.cpes = cpes;
        self
    }

    pub fn with_metadata(mut self, metadata: PackageMetadata) -> Self {
        self.metadata = metadata;
        self.id = compute_id(&self.name, &self.version, self.package_type, &self.metadata);
        self
    }

    /// Keeps an id carried by a decoded document instead of the computed one
    pub(crate) fn with_id(mut self, id: PackageId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    pub fn found_by(&self) -> &str {
        &self.found_by
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    pub fn licenses(&self) -> &Licenses {
        &self.licenses
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn purl(&self) -> Option<&str> {
        self.purl.as_deref()
    }

    pub fn cpes(&self) -> &[String] {
        &self.cpes
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Unions another observation's locations into this package
    pub(crate) fn merge_locations(&mut self, locations: &LocationSet) -> usize {
        self.locations.extend(locations.iter().cloned())
    }
}

fn compute_id(
    name: &str,
    version: &str,
    package_type: PackageType,
    metadata: &PackageMetadata,
) -> PackageId {
    let identity = serde_json::json!({
        "name": name,
        "version": version,
        "type": package_type.as_str(),
        "metadataType": metadata.type_name(),
        "metadata": metadata.to_json(),
    });
    PackageId(content_id(identity.to_string().as_bytes()))
}

fn validate_name(name: String) -> Result<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        anyhow::bail!("Package name cannot be empty");
    }

    // Security: Length limit to prevent DoS
    if name.len() > MAX_PACKAGE_NAME_LENGTH {
        anyhow::bail!(
            "Package name is too long ({} bytes). Maximum allowed: {} bytes",
            name.len(),
            MAX_PACKAGE_NAME_LENGTH
        );
    }

    if name.chars().any(char::is_control) {
        anyhow::bail!("Package name contains control characters");
    }

    Ok(name)
}

fn validate_version(version: String) -> Result<String> {
    let version = version.trim().to_string();

    // Security: Length limit to prevent DoS
    if version.len() > MAX_VERSION_LENGTH {
        anyhow::bail!(
            "Package version is too long ({} bytes). Maximum allowed: {} bytes",
            version.len(),
            MAX_VERSION_LENGTH
        );
    }

    if version.chars().any(char::is_control) {
        anyhow::bail!("Package version contains control characters");
    }

    Ok(version)
}
