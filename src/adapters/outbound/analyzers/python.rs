use super::control_file::{parse_headers, Paragraph};
use crate::cataloging::domain::{
    clean_path, Licenses, Location, Package, PackageMetadata, PackageType, PythonFileRecord,
    PythonMetadata,
};
use crate::cataloging::policies::LicensePolicy;
use crate::ports::outbound::{FileResolver, PackageAnalyzer};
use crate::shared::Result;

const METADATA_GLOBS: [&str; 2] = ["**/*.dist-info/METADATA", "**/*.egg-info/PKG-INFO"];

/// PythonPackageAnalyzer adapter reading installed Python distributions
///
/// Each `*.dist-info/METADATA` or `*.egg-info/PKG-INFO` file is one package.
/// The sibling `RECORD` (or `installed-files.txt` for eggs) lists the files
/// the distribution installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonPackageAnalyzer;

impl PythonPackageAnalyzer {
    pub const NAME: &'static str = "python";

    pub fn new() -> Self {
        Self
    }

    fn parse_distribution(
        &self,
        resolver: &dyn FileResolver,
        location: &Location,
    ) -> Result<Option<Package>> {
        let headers = parse_headers(&resolver.file_contents_string(location)?);
        let Some(name) = headers.get("Name") else {
            tracing::debug!(path = %location.real_path(), "metadata without a Name field");
            return Ok(None);
        };
        let version = headers.get("Version").unwrap_or_default();

        let metadata_dir = parent_dir(location.real_path());
        let site_packages = parent_dir(metadata_dir);

        let mut locations = vec![location.clone()];
        let mut files = Vec::new();
        if let Some((record_location, records)) =
            self.read_record(resolver, location, metadata_dir, site_packages)
        {
            locations.push(record_location);
            files = records;
        }

        let licenses = select_licenses(&headers);
        let package = Package::new(name, version, PackageType::Python)?
            .with_found_by(Self::NAME)
            .with_locations(locations)
            .with_licenses(licenses)
            .with_metadata(PackageMetadata::Python(PythonMetadata {
                author: headers.get("Author").map(str::to_string),
                author_email: headers.get("Author-email").map(str::to_string),
                platform: headers.get("Platform").map(str::to_string),
                site_packages_root_path: Some(site_packages.to_string()),
                files,
            }));
        Ok(Some(package))
    }

    /// Reads the installed-files manifest next to the metadata file
    fn read_record(
        &self,
        resolver: &dyn FileResolver,
        location: &Location,
        metadata_dir: &str,
        site_packages: &str,
    ) -> Option<(Location, Vec<PythonFileRecord>)> {
        let candidates = [
            format!("{}/RECORD", metadata_dir),
            format!("{}/installed-files.txt", metadata_dir),
        ];

        for candidate in &candidates {
            let Some(record_location) = resolver.relative_file_by_path(location, candidate) else {
                continue;
            };
            let contents = match resolver.file_contents_string(&record_location) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!(path = %candidate, error = %e, "unreadable file record");
                    continue;
                }
            };
            let base = if candidate.ends_with("RECORD") {
                site_packages
            } else {
                metadata_dir
            };
            return Some((record_location, parse_record(&contents, base)));
        }
        None
    }
}

impl PackageAnalyzer for PythonPackageAnalyzer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(&self, resolver: &dyn FileResolver) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        for location in resolver.files_by_glob(&METADATA_GLOBS)? {
            match self.parse_distribution(resolver, &location) {
                Ok(Some(package)) => packages.push(package),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %location.real_path(), error = %e, "skipping python distribution")
                }
            }
        }
        Ok(packages)
    }
}

fn select_licenses(headers: &Paragraph) -> Licenses {
    let selected = LicensePolicy::select_license(
        headers.get("License").map(str::to_string),
        headers.get("License-Expression").map(str::to_string),
        &headers.get_all("Classifier"),
    );
    match selected {
        Some(license) => Licenses::from_values([license]),
        None => Licenses::NotFound,
    }
}

/// Parses `RECORD` CSV lines (`path,hash,size`) or plain path lists
fn parse_record(contents: &str, base: &str) -> Vec<PythonFileRecord> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            // Paths may contain commas; hash and size never do
            let mut fields = line.rsplitn(3, ',');
            let (path, digest, size) = match (fields.next(), fields.next(), fields.next()) {
                (Some(size), Some(digest), Some(path)) => (path, Some(digest), Some(size)),
                _ => (line, None, None),
            };
            PythonFileRecord {
                path: clean_path(&format!("{}/{}", base, path.trim_matches('"'))),
                digest: digest
                    .filter(|d| !d.is_empty())
                    .map(|d| d.replacen('=', ":", 1)),
                size: size.and_then(|s| s.parse().ok()),
            }
        })
        .collect()
}

fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::filesystem::DirectoryResolver;
    use std::fs;
    use tempfile::TempDir;

    const SIX_METADATA: &str = "Metadata-Version: 2.1\nName: six\nVersion: 1.16.0\nAuthor: Benjamin Peterson\nAuthor-email: benjamin@python.org\nLicense: MIT\nPlatform: UNKNOWN\nClassifier: License :: OSI Approved :: MIT License\n\nSix is a Python 2 and 3 compatibility library.\n";

    fn site_packages(root: &TempDir) -> std::path::PathBuf {
        let site = root.path().join("usr/lib/python3/site-packages");
        fs::create_dir_all(site.join("six-1.16.0.dist-info")).unwrap();
        site
    }

    #[test]
    fn test_analyze_dist_info() {
        let root = TempDir::new().unwrap();
        let site = site_packages(&root);
        fs::write(site.join("six-1.16.0.dist-info/METADATA"), SIX_METADATA).unwrap();
        fs::write(
            site.join("six-1.16.0.dist-info/RECORD"),
            "six.py,sha256=abc,34549\nsix-1.16.0.dist-info/RECORD,,\n",
        )
        .unwrap();

        let resolver = DirectoryResolver::new(root.path()).unwrap();
        let packages = PythonPackageAnalyzer::new().analyze(&resolver).unwrap();

        assert_eq!(packages.len(), 1);
        let package = &packages[0];
        assert_eq!(package.name(), "six");
        assert_eq!(package.version(), "1.16.0");
        assert_eq!(package.found_by(), "python");
        assert_eq!(package.licenses(), &Licenses::from_values(["MIT"]));
        assert_eq!(package.locations().len(), 2);

        let PackageMetadata::Python(metadata) = package.metadata() else {
            panic!("expected python metadata");
        };
        assert_eq!(metadata.author.as_deref(), Some("Benjamin Peterson"));
        assert_eq!(
            metadata.site_packages_root_path.as_deref(),
            Some("/usr/lib/python3/site-packages")
        );
        assert_eq!(metadata.files[0].path, "/usr/lib/python3/site-packages/six.py");
        assert_eq!(metadata.files[0].digest.as_deref(), Some("sha256:abc"));
        assert_eq!(metadata.files[0].size, Some(34549));
        assert_eq!(metadata.files[1].digest, None);
    }

    #[test]
    fn test_analyze_egg_info_with_classifier_license() {
        let root = TempDir::new().unwrap();
        let egg = root.path().join("opt/app/requests.egg-info");
        fs::create_dir_all(&egg).unwrap();
        fs::write(
            egg.join("PKG-INFO"),
            "Name: requests\nVersion: 2.31.0\nLicense: UNKNOWN\nClassifier: License :: OSI Approved :: Apache Software License\n",
        )
        .unwrap();
        fs::write(egg.join("installed-files.txt"), "../requests/__init__.py\n").unwrap();

        let resolver = DirectoryResolver::new(root.path()).unwrap();
        let packages = PythonPackageAnalyzer::new().analyze(&resolver).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(
            packages[0].licenses(),
            &Licenses::from_values(["Apache Software License"])
        );
        assert_eq!(
            packages[0].metadata().owned_files(),
            vec!["/opt/app/requests/__init__.py"]
        );
    }

    #[test]
    fn test_metadata_without_name_is_skipped() {
        let root = TempDir::new().unwrap();
        let site = site_packages(&root);
        fs::write(site.join("six-1.16.0.dist-info/METADATA"), "Version: 1.0\n").unwrap();

        let resolver = DirectoryResolver::new(root.path()).unwrap();
        assert!(PythonPackageAnalyzer::new().analyze(&resolver).unwrap().is_empty());
    }

    #[test]
    fn test_missing_license_is_not_found() {
        let root = TempDir::new().unwrap();
        let site = site_packages(&root);
        fs::write(
            site.join("six-1.16.0.dist-info/METADATA"),
            "Name: six\nVersion: 1.16.0\n",
        )
        .unwrap();

        let resolver = DirectoryResolver::new(root.path()).unwrap();
        let packages = PythonPackageAnalyzer::new().analyze(&resolver).unwrap();
        assert!(packages[0].licenses().is_not_found());
    }

    #[test]
    fn test_parse_record_paths_with_commas() {
        let records = parse_record("\"a,b.py\",sha256=x,1\n", "/site");
        assert_eq!(records[0].path, "/site/a,b.py");
    }
}
