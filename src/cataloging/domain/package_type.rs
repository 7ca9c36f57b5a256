use std::fmt;
use std::str::FromStr;

/// PackageType identifies the ecosystem a package belongs to
///
/// Variants are declared in the same order as their string tags so the
/// derived ordering matches the lexical ordering used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageType {
    Apk,
    Deb,
    Gem,
    GoModule,
    JavaArchive,
    Npm,
    Python,
    Rpm,
    RustCrate,
    Unknown,
}

impl PackageType {
    pub const ALL: [PackageType; 10] = [
        PackageType::Apk,
        PackageType::Deb,
        PackageType::Gem,
        PackageType::GoModule,
        PackageType::JavaArchive,
        PackageType::Npm,
        PackageType::Python,
        PackageType::Rpm,
        PackageType::RustCrate,
        PackageType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Apk => "apk",
            PackageType::Deb => "deb",
            PackageType::Gem => "gem",
            PackageType::GoModule => "go-module",
            PackageType::JavaArchive => "java-archive",
            PackageType::Npm => "npm",
            PackageType::Python => "python",
            PackageType::Rpm => "rpm",
            PackageType::RustCrate => "rust-crate",
            PackageType::Unknown => "unknown",
        }
    }

    /// The package-url type for this ecosystem
    pub fn purl_type(&self) -> &'static str {
        match self {
            PackageType::Apk => "apk",
            PackageType::Deb => "deb",
            PackageType::Gem => "gem",
            PackageType::GoModule => "golang",
            PackageType::JavaArchive => "maven",
            PackageType::Npm => "npm",
            PackageType::Python => "pypi",
            PackageType::Rpm => "rpm",
            PackageType::RustCrate => "cargo",
            PackageType::Unknown => "generic",
        }
    }

    /// Inverse of [`PackageType::purl_type`]; unknown purl types map to `Unknown`
    pub fn from_purl_type(purl_type: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.purl_type() == purl_type)
            .unwrap_or(PackageType::Unknown)
    }

    /// Implementation language implied by the ecosystem, if any
    pub fn language(&self) -> Option<&'static str> {
        match self {
            PackageType::Gem => Some("ruby"),
            PackageType::GoModule => Some("go"),
            PackageType::JavaArchive => Some("java"),
            PackageType::Npm => Some("javascript"),
            PackageType::Python => Some("python"),
            PackageType::RustCrate => Some("rust"),
            PackageType::Apk | PackageType::Deb | PackageType::Rpm | PackageType::Unknown => None,
        }
    }

    /// Whether packages of this type are managed by the operating system
    pub fn is_os_package(&self) -> bool {
        matches!(self, PackageType::Apk | PackageType::Deb | PackageType::Rpm)
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown package type: {}", s))
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
