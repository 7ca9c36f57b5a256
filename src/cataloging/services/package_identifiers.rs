use crate::cataloging::domain::{Distro, Package, PackageMetadata, PackageType};

/// PackageIdentifiers service generating package URLs and CPE candidates
///
/// Analyzers may leave `purl` and `cpes` empty; normalization fills them in
/// once the distribution of the source is known, since OS package URLs are
/// namespaced by it.
pub struct PackageIdentifiers;

impl PackageIdentifiers {
    /// Fills in a missing purl and an empty CPE list, keeping analyzer values
    pub fn normalize(package: Package, distro: Option<&Distro>) -> Package {
        let package = if package.purl().is_none() {
            let purl = Self::purl(&package, distro);
            package.with_purl(purl)
        } else {
            package
        };

        if package.cpes().is_empty() {
            let cpes = Self::cpes(&package);
            package.with_cpes(cpes)
        } else {
            package
        }
    }

    /// Builds `pkg:<type>/<namespace>/<name>@<version>?<qualifiers>`
    pub fn purl(package: &Package, distro: Option<&Distro>) -> String {
        let package_type = package.package_type();
        let name = match package_type {
            PackageType::Python => normalize_python_name(package.name()),
            _ => package.name().to_string(),
        };

        let mut namespace: Vec<String> = Vec::new();
        let mut name = name.as_str();
        if let Some((scope, rest)) = name.rsplit_once('/') {
            namespace.extend(scope.split('/').filter(|s| !s.is_empty()).map(encode));
            name = rest;
        }
        if package_type.is_os_package() {
            if let Some(distro) = distro.filter(|d| !d.name.is_empty()) {
                namespace.insert(0, encode(&distro.name.to_lowercase()));
            }
        }

        let mut purl = format!("pkg:{}/", package_type.purl_type());
        for segment in &namespace {
            purl.push_str(segment);
            purl.push('/');
        }
        purl.push_str(&encode(name));
        if !package.version().is_empty() {
            purl.push('@');
            purl.push_str(&encode(package.version()));
        }

        let qualifiers = qualifiers(package, distro);
        if !qualifiers.is_empty() {
            let rendered: Vec<String> = qualifiers
                .iter()
                .map(|(key, value)| format!("{}={}", key, encode(value)))
                .collect();
            purl.push('?');
            purl.push_str(&rendered.join("&"));
        }
        purl
    }

    /// Builds CPE 2.3 candidates; packages of unknown type get none
    pub fn cpes(package: &Package) -> Vec<String> {
        if package.package_type() == PackageType::Unknown {
            return Vec::new();
        }

        let product = escape_cpe(package.name());
        let version = if package.version().is_empty() {
            "*".to_string()
        } else {
            escape_cpe(package.version())
        };

        let mut vendors = vec![product.clone()];
        if let PackageMetadata::Python(metadata) = package.metadata() {
            if let Some(author) = metadata.author.as_deref().filter(|a| !a.trim().is_empty()) {
                let vendor = escape_cpe(author);
                if !vendors.contains(&vendor) {
                    vendors.push(vendor);
                }
            }
        }

        vendors
            .into_iter()
            .map(|vendor| {
                format!(
                    "cpe:2.3:a:{}:{}:{}:*:*:*:*:*:*:*",
                    vendor, product, version
                )
            })
            .collect()
    }
}

/// Qualifiers in key order, as the package-url canonical form requires
fn qualifiers(package: &Package, distro: Option<&Distro>) -> Vec<(&'static str, String)> {
    let mut qualifiers = Vec::new();
    if let PackageMetadata::Dpkg(metadata) = package.metadata() {
        if !metadata.architecture.is_empty() {
            qualifiers.push(("arch", metadata.architecture.clone()));
        }
    }
    if package.package_type().is_os_package() {
        if let Some(distro) = distro.filter(|d| !d.name.is_empty()) {
            let value = if distro.version.is_empty() {
                distro.name.to_lowercase()
            } else {
                format!("{}-{}", distro.name.to_lowercase(), distro.version)
            };
            qualifiers.push(("distro", value));
        }
    }
    qualifiers
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Python distribution names compare case-insensitively with `_`, `.` and `-` folded
fn normalize_python_name(name: &str) -> String {
    name.to_lowercase().replace(['_', '.'], "-")
}

fn escape_cpe(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        match c {
            ' ' => escaped.push('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') => escaped.push(c),
            c => {
                escaped.push('\\');
                escaped.push(c);
            }
        }
    }
    escaped
}
