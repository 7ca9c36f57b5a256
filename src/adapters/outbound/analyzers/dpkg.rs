use super::control_file::{parse_paragraphs, Paragraph};
use crate::cataloging::domain::{
    DpkgFileRecord, DpkgMetadata, Licenses, Location, Package, PackageMetadata, PackageType,
};
use crate::ports::outbound::{FileResolver, PackageAnalyzer};
use crate::shared::Result;
use std::collections::{BTreeSet, HashMap};

const STATUS_FILE: &str = "/var/lib/dpkg/status";
const STATUS_DIR_GLOB: &str = "/var/lib/dpkg/status.d/*";
const INFO_DIR: &str = "/var/lib/dpkg/info";
const DOC_DIR: &str = "/usr/share/doc";
const INSTALLED: &str = "install ok installed";

/// DpkgAnalyzer adapter reading the Debian package database
///
/// Installed packages come from `/var/lib/dpkg/status` (and the per-package
/// files in `status.d/` used by distroless images). Owned files are read
/// from `info/<package>[:<arch>].list`, digests from the matching
/// `.md5sums`, licenses from the machine-readable `copyright` file.
#[derive(Debug, Default, Clone, Copy)]
pub struct DpkgAnalyzer;

impl DpkgAnalyzer {
    pub const NAME: &'static str = "dpkg";

    pub fn new() -> Self {
        Self
    }

    fn parse_entry(
        &self,
        resolver: &dyn FileResolver,
        status_location: &Location,
        paragraph: &Paragraph,
    ) -> Result<Option<Package>> {
        let Some(name) = paragraph.get("Package") else {
            return Ok(None);
        };
        if let Some(status) = paragraph.get("Status") {
            if status != INSTALLED {
                return Ok(None);
            }
        }

        let version = paragraph.get("Version").unwrap_or_default();
        let architecture = paragraph.get("Architecture").unwrap_or_default();

        let mut locations = vec![status_location.clone()];
        let mut files = Vec::new();
        if let Some((list_location, paths)) =
            self.read_info_file(resolver, status_location, name, architecture, "list")
        {
            let digests = self
                .read_info_file(resolver, status_location, name, architecture, "md5sums")
                .map(|(location, lines)| {
                    locations.push(location);
                    parse_md5sums(&lines)
                })
                .unwrap_or_default();
            locations.push(list_location);
            files = paths
                .iter()
                .map(|line| line.trim())
                .filter(|path| path.starts_with('/') && *path != "/.")
                .map(|path| DpkgFileRecord {
                    path: path.to_string(),
                    digest: digests.get(path).cloned(),
                })
                .collect();
        }

        let copyright_path = format!("{}/{}/copyright", DOC_DIR, name);
        let licenses = match resolver.relative_file_by_path(status_location, &copyright_path) {
            Some(location) => {
                let licenses = resolver
                    .file_contents_string(&location)
                    .map(|text| parse_copyright_licenses(&text))
                    .unwrap_or_default();
                locations.push(location);
                licenses
            }
            None => Licenses::NotFound,
        };

        let source = paragraph
            .get("Source")
            .map(|s| s.split_whitespace().next().unwrap_or(s).to_string());

        let package = Package::new(name, version, PackageType::Deb)?
            .with_found_by(Self::NAME)
            .with_locations(locations)
            .with_licenses(licenses)
            .with_metadata(PackageMetadata::Dpkg(DpkgMetadata {
                package: name.to_string(),
                source,
                version: version.to_string(),
                architecture: architecture.to_string(),
                maintainer: paragraph.get("Maintainer").map(str::to_string),
                installed_size: paragraph.get("Installed-Size").and_then(|s| s.parse().ok()),
                files,
            }));
        Ok(Some(package))
    }

    /// Reads `info/<name>:<arch>.<ext>`, falling back to `info/<name>.<ext>`
    fn read_info_file(
        &self,
        resolver: &dyn FileResolver,
        status_location: &Location,
        name: &str,
        architecture: &str,
        extension: &str,
    ) -> Option<(Location, Vec<String>)> {
        let mut candidates = Vec::with_capacity(2);
        if !architecture.is_empty() {
            candidates.push(format!("{}/{}:{}.{}", INFO_DIR, name, architecture, extension));
        }
        candidates.push(format!("{}/{}.{}", INFO_DIR, name, extension));

        candidates.iter().find_map(|candidate| {
            let location = resolver.relative_file_by_path(status_location, candidate)?;
            match resolver.file_contents_string(&location) {
                Ok(text) => Some((location, text.lines().map(str::to_string).collect())),
                Err(e) => {
                    tracing::warn!(path = %candidate, error = %e, "unreadable dpkg info file");
                    None
                }
            }
        })
    }
}

impl PackageAnalyzer for DpkgAnalyzer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(&self, resolver: &dyn FileResolver) -> Result<Vec<Package>> {
        let mut status_files = resolver.files_by_path(&[STATUS_FILE])?;
        status_files.extend(resolver.files_by_glob(&[STATUS_DIR_GLOB])?);

        let mut packages = Vec::new();
        for location in status_files {
            let text = resolver.file_contents_string(&location)?;
            for paragraph in parse_paragraphs(&text) {
                match self.parse_entry(resolver, &location, &paragraph) {
                    Ok(Some(package)) => packages.push(package),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        path = %location.real_path(),
                        package = paragraph.get("Package").unwrap_or_default(),
                        error = %e,
                        "skipping dpkg entry"
                    ),
                }
            }
        }
        tracing::debug!(count = packages.len(), "dpkg packages found");
        Ok(packages)
    }
}

/// Maps absolute paths to `md5:<hex>` digests
fn parse_md5sums(lines: &[String]) -> HashMap<String, String> {
    lines
        .iter()
        .filter_map(|line| {
            let (digest, path) = line.trim().split_once(char::is_whitespace)?;
            let path = path.trim();
            let path = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{}", path)
            };
            Some((path, format!("md5:{}", digest)))
        })
        .collect()
}

/// Collects `License:` values from a DEP-5 copyright file
fn parse_copyright_licenses(text: &str) -> Licenses {
    let values: BTreeSet<String> = text
        .lines()
        .filter_map(|line| line.strip_prefix("License:"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    Licenses::from_values(values)
}
