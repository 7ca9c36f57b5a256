use crate::cataloging::domain::identity::ID_HEX_LEN;
use crate::cataloging::domain::{
    Catalog, Coordinates, Endpoint, ImageMetadata, LayerRef, Licenses, Location, Package,
    PackageId, PackageType, Relationship, RelationshipKind, Sbom, SourceMetadata,
    ToolDescriptor,
};
use crate::cataloging::policies::{LicensePolicy, NO_ASSERTION};
use crate::cataloging::services::{DocumentInfo, PackageIdentifiers};
use crate::ports::outbound::{DocumentDecoder, DocumentEncoder};
use crate::shared::error::CatalogerError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const FORMAT_ID: &str = "spdx-json";
const SPDX_VERSION: &str = "SPDX-2.3";
const SUPPORTED_VERSIONS: [&str; 2] = ["SPDX-2.2", "SPDX-2.3"];
const DATA_LICENSE: &str = "CC0-1.0";
const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
const ROOT_PREFIX: &str = "SPDXRef-DocumentRoot-";
const NAMESPACE_BASE: &str = "https://sbom-cataloger.dev/spdxdocs";
const SOURCE_INFO_PREFIX: &str = "acquired package info from ";
const LAYER_COMMENT_PREFIX: &str = "layerID: ";

const EVIDENT_BY: &str = "evident-by";
const EVIDENT_BY_COMMENT: &str =
    "evident-by: indicates the package's existence is evident by the given file";
const OWNERSHIP_COMMENT: &str = "ownership-by-file-overlap: indicates that the parent package claims ownership of a child package since the parent metadata indicates overlap with a location that a cataloger found the child package by";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: String,
    #[serde(default)]
    data_license: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    document_namespace: String,
    creation_info: SpdxCreationInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    document_describes: Vec<String>,
    #[serde(default)]
    packages: Vec<SpdxPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<SpdxFile>,
    #[serde(default)]
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxCreationInfo {
    created: String,
    #[serde(default)]
    creators: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(default)]
    version_info: String,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default = "no_assertion")]
    download_location: String,
    #[serde(default)]
    files_analyzed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_info: Option<String>,
    #[serde(default = "no_assertion")]
    license_concluded: String,
    #[serde(default = "no_assertion")]
    license_declared: String,
    #[serde(default = "no_assertion")]
    copyright_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    checksums: Vec<SpdxChecksum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<SpdxExternalRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_package_purpose: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    reference_category: String,
    reference_type: String,
    reference_locator: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxChecksum {
    algorithm: String,
    checksum_value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxFile {
    file_name: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    #[serde(default = "no_assertion")]
    license_concluded: String,
    #[serde(default = "no_assertion")]
    copyright_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

fn no_assertion() -> String {
    NO_ASSERTION.to_string()
}

/// SpdxJsonFormat adapter for SPDX 2.3 JSON documents
///
/// The source becomes a root package described by the document; every
/// cataloged package is contained by it. Evidencing files are listed as
/// SPDX files and linked from their package.
///
/// Lossy by design: ecosystem metadata is not represented (package ids are
/// recomputed on decode), image tags and layer sizes are dropped, layer
/// indexes are not kept (digests are) and non-SPDX licenses keep their
/// sanitized `LicenseRef-` spelling.
#[derive(Debug, Default, Clone)]
pub struct SpdxJsonFormat {
    document_info: Option<DocumentInfo>,
}

impl SpdxJsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses fixed creation values instead of generating them per encode
    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.document_info = Some(info);
        self
    }

    fn build_package(&self, package: &Package, sbom: &Sbom) -> SpdxPackage {
        let license = LicensePolicy::to_spdx_expression(package.licenses());
        let purl = package
            .purl()
            .map(str::to_string)
            .unwrap_or_else(|| PackageIdentifiers::purl(package, sbom.distro()));

        let mut external_refs: Vec<SpdxExternalRef> = package
            .cpes()
            .iter()
            .map(|cpe| SpdxExternalRef {
                reference_category: "SECURITY".to_string(),
                reference_type: "cpe23Type".to_string(),
                reference_locator: cpe.clone(),
            })
            .collect();
        external_refs.push(SpdxExternalRef {
            reference_category: "PACKAGE-MANAGER".to_string(),
            reference_type: "purl".to_string(),
            reference_locator: purl,
        });

        let source_info = Some(package.found_by())
            .filter(|found_by| !found_by.is_empty())
            .map(|found_by| {
                let paths: Vec<&str> = package.locations().iter().map(|l| l.real_path()).collect();
                format!(
                    "{}{} analyzer: {}",
                    SOURCE_INFO_PREFIX,
                    found_by,
                    paths.join(", ")
                )
            });

        SpdxPackage {
            spdx_id: package_spdx_id(package),
            name: package.name().to_string(),
            version_info: package.version().to_string(),
            supplier: Some(NO_ASSERTION.to_string()),
            download_location: NO_ASSERTION.to_string(),
            files_analyzed: false,
            source_info,
            license_concluded: license.clone(),
            license_declared: license,
            copyright_text: NO_ASSERTION.to_string(),
            checksums: Vec::new(),
            external_refs,
            primary_package_purpose: None,
        }
    }

    fn build_root_package(&self, source: &SourceMetadata) -> SpdxPackage {
        let (version_info, checksums, purpose) = match source {
            SourceMetadata::Directory { .. } => (String::new(), Vec::new(), "FILE"),
            SourceMetadata::Image(image) => {
                let checksums = image
                    .id
                    .strip_prefix("sha256:")
                    .map(|hex| SpdxChecksum {
                        algorithm: "SHA256".to_string(),
                        checksum_value: hex.to_string(),
                    })
                    .into_iter()
                    .collect();
                (image.manifest_digest.clone(), checksums, "CONTAINER")
            }
        };
        SpdxPackage {
            spdx_id: root_spdx_id(source),
            name: source.name().to_string(),
            version_info,
            supplier: Some(NO_ASSERTION.to_string()),
            download_location: NO_ASSERTION.to_string(),
            files_analyzed: false,
            source_info: None,
            license_concluded: NO_ASSERTION.to_string(),
            license_declared: NO_ASSERTION.to_string(),
            copyright_text: NO_ASSERTION.to_string(),
            checksums,
            external_refs: Vec::new(),
            primary_package_purpose: Some(purpose.to_string()),
        }
    }

    fn build_files(&self, packages: &[Package]) -> Vec<SpdxFile> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for location in packages.iter().flat_map(|p| p.locations().iter()) {
            let coordinates = location.coordinates();
            if !seen.insert(coordinates.clone()) {
                continue;
            }
            files.push(SpdxFile {
                file_name: coordinates.real_path().to_string(),
                spdx_id: file_spdx_id(&coordinates),
                license_concluded: NO_ASSERTION.to_string(),
                copyright_text: NO_ASSERTION.to_string(),
                comment: coordinates
                    .layer_digest()
                    .map(|digest| format!("{}{}", LAYER_COMMENT_PREFIX, digest)),
            });
        }
        files
    }

    fn build_relationship(
        &self,
        relationship: &Relationship,
        spdx_ids: &HashMap<&PackageId, String>,
        root_id: &str,
    ) -> Result<SpdxRelationship> {
        let element = |endpoint: &Endpoint| -> Result<String> {
            match endpoint {
                Endpoint::DocumentRoot => Ok(DOCUMENT_ID.to_string()),
                Endpoint::Source => Ok(root_id.to_string()),
                Endpoint::Package(id) => spdx_ids.get(id).cloned().ok_or_else(|| {
                    anyhow::anyhow!("relationship references unknown package {}", id)
                }),
                Endpoint::File(coordinates) => Ok(file_spdx_id(coordinates)),
            }
        };
        let (relationship_type, comment) = match relationship.kind {
            RelationshipKind::Describes => ("DESCRIBES", None),
            RelationshipKind::Contains => ("CONTAINS", None),
            RelationshipKind::DescribedBy => ("OTHER", Some(EVIDENT_BY_COMMENT)),
            RelationshipKind::OwnershipByFileOverlap => ("OTHER", Some(OWNERSHIP_COMMENT)),
        };
        Ok(SpdxRelationship {
            spdx_element_id: element(&relationship.from)?,
            relationship_type: relationship_type.to_string(),
            related_spdx_element: element(&relationship.to)?,
            comment: comment.map(str::to_string),
        })
    }
}

impl DocumentEncoder for SpdxJsonFormat {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn encode(&self, sbom: &Sbom) -> Result<String> {
        let info = self
            .document_info
            .clone()
            .unwrap_or_else(DocumentInfo::generate);
        let source = sbom.source();
        let root = self.build_root_package(source);
        let root_id = root.spdx_id.clone();

        let catalog_packages = sbom.catalog().sorted();
        let spdx_ids: HashMap<&PackageId, String> = catalog_packages
            .iter()
            .map(|p| (p.id(), package_spdx_id(p)))
            .collect();

        let mut packages = vec![root];
        packages.extend(catalog_packages.iter().map(|p| self.build_package(p, sbom)));

        let relationships = sbom
            .relationships()
            .iter()
            .map(|r| self.build_relationship(r, &spdx_ids, &root_id))
            .collect::<Result<Vec<_>>>()?;

        let document = SpdxDocument {
            spdx_version: SPDX_VERSION.to_string(),
            data_license: DATA_LICENSE.to_string(),
            spdx_id: DOCUMENT_ID.to_string(),
            name: source.name().to_string(),
            document_namespace: format!(
                "{}/{}/{}-{}",
                NAMESPACE_BASE,
                source.scheme(),
                sanitize_id(source.name()),
                info.serial_number()
            ),
            creation_info: SpdxCreationInfo {
                created: info.timestamp().to_string(),
                creators: vec![
                    "Organization: sbom-cataloger".to_string(),
                    format!(
                        "Tool: {}-{}",
                        sbom.descriptor().name(),
                        sbom.descriptor().version()
                    ),
                ],
            },
            document_describes: Vec::new(),
            packages,
            files: self.build_files(&catalog_packages),
            relationships,
        };

        serde_json::to_string_pretty(&document).map_err(Into::into)
    }
}

impl DocumentDecoder for SpdxJsonFormat {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn identify(&self, document: &[u8]) -> bool {
        serde_json::from_slice::<serde_json::Value>(document)
            .map(|value| value.get("spdxVersion").is_some())
            .unwrap_or(false)
    }

    fn decode(&self, document: &[u8]) -> Result<Sbom> {
        let value = super::parse_json(document)?;
        let version = value
            .get("spdxVersion")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| CatalogerError::decode("spdxVersion", "missing SPDX version"))?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(CatalogerError::UnsupportedSchema {
                format: FORMAT_ID.to_string(),
                version: version.to_string(),
            }
            .into());
        }
        let document: SpdxDocument = serde_json::from_value(value)
            .map_err(|e| CatalogerError::decode("document", e.to_string()))?;

        let root_id = find_root_id(&document)?;
        let root = document
            .packages
            .iter()
            .find(|p| p.spdx_id == root_id)
            .ok_or_else(|| {
                CatalogerError::decode(
                    "packages",
                    format!("described element '{}' is not a package", root_id),
                )
            })?;
        let source = decode_source(root);

        let files: HashMap<&str, Location> = document
            .files
            .iter()
            .map(|f| (f.spdx_id.as_str(), decode_file(f)))
            .collect();

        // package SPDXID -> evidencing files
        let mut evidence: HashMap<&str, Vec<Location>> = HashMap::new();
        for r in &document.relationships {
            if relationship_kind(r) == Some(RelationshipKind::DescribedBy) {
                if let Some(location) = files.get(r.related_spdx_element.as_str()) {
                    evidence
                        .entry(r.spdx_element_id.as_str())
                        .or_default()
                        .push(location.clone());
                }
            }
        }

        let catalog = Catalog::new();
        let mut package_ids: HashMap<&str, PackageId> = HashMap::new();
        for (index, spdx_package) in document.packages.iter().enumerate() {
            if spdx_package.spdx_id == root_id {
                continue;
            }
            let locations = evidence
                .remove(spdx_package.spdx_id.as_str())
                .unwrap_or_default();
            let package = decode_package(index, spdx_package, locations)?;
            package_ids.insert(spdx_package.spdx_id.as_str(), package.id().clone());
            catalog.add(package);
        }

        let resolve = |field: String, id: &str| -> Result<Endpoint> {
            if id == DOCUMENT_ID {
                Ok(Endpoint::DocumentRoot)
            } else if id == root_id {
                Ok(Endpoint::Source)
            } else if let Some(package_id) = package_ids.get(id) {
                Ok(Endpoint::Package(package_id.clone()))
            } else if let Some(location) = files.get(id) {
                Ok(Endpoint::File(location.coordinates()))
            } else {
                Err(CatalogerError::decode(field, format!("unknown element id '{}'", id)).into())
            }
        };

        let mut relationships = Vec::new();
        for (index, r) in document.relationships.iter().enumerate() {
            let Some(kind) = relationship_kind(r) else {
                tracing::debug!(
                    relationship_type = %r.relationship_type,
                    "skipping SPDX relationship without an internal counterpart"
                );
                continue;
            };
            let field = format!("relationships[{}]", index);
            relationships.push(Relationship::new(
                resolve(format!("{}.spdxElementId", field), &r.spdx_element_id)?,
                resolve(
                    format!("{}.relatedSpdxElement", field),
                    &r.related_spdx_element,
                )?,
                kind,
            ));
        }

        let descriptor = decode_descriptor(&document.creation_info);
        let sbom = Sbom::new(catalog, relationships, source, None, descriptor)?;
        Ok(sbom)
    }
}

/// `SPDXRef-Package-<type>-<name>-<version>-<id>`
fn package_spdx_id(package: &Package) -> String {
    let mut id = format!(
        "SPDXRef-Package-{}-{}",
        package.package_type(),
        sanitize_id(package.name())
    );
    if !package.version().is_empty() {
        id.push('-');
        id.push_str(&sanitize_id(package.version()));
    }
    id.push('-');
    id.push_str(package.id().as_str());
    id
}

/// Reads the package id back from the tail of a package SPDXID
///
/// Documents from other tools carry no such suffix; their packages get a
/// computed id instead.
fn package_id_from_spdx_id(spdx_id: &str) -> Option<PackageId> {
    let rest = spdx_id.strip_prefix("SPDXRef-Package-")?;
    let (_, suffix) = rest.rsplit_once('-')?;
    let is_id = suffix.len() == ID_HEX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    is_id.then(|| PackageId::from_hex(suffix))
}

fn root_spdx_id(source: &SourceMetadata) -> String {
    let kind = match source {
        SourceMetadata::Directory { .. } => "Directory",
        SourceMetadata::Image(_) => "Image",
    };
    format!("{}{}-{}", ROOT_PREFIX, kind, sanitize_id(source.name()))
}

fn file_spdx_id(coordinates: &Coordinates) -> String {
    format!("SPDXRef-File-{}", coordinates.id())
}

/// SPDX element ids only allow letters, numbers, `.` and `-`
fn sanitize_id(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    sanitized.trim_matches('-').to_string()
}

fn relationship_kind(relationship: &SpdxRelationship) -> Option<RelationshipKind> {
    match relationship.relationship_type.as_str() {
        "DESCRIBES" => Some(RelationshipKind::Describes),
        "CONTAINS" => Some(RelationshipKind::Contains),
        "OTHER" => {
            let comment = relationship.comment.as_deref()?;
            let (tag, _) = comment.split_once(':')?;
            match tag {
                EVIDENT_BY => Some(RelationshipKind::DescribedBy),
                other => other.parse().ok(),
            }
        }
        _ => None,
    }
}

fn find_root_id(document: &SpdxDocument) -> Result<String> {
    document
        .relationships
        .iter()
        .find(|r| r.spdx_element_id == DOCUMENT_ID && r.relationship_type == "DESCRIBES")
        .map(|r| r.related_spdx_element.clone())
        .or_else(|| document.document_describes.first().cloned())
        .or_else(|| {
            document
                .packages
                .iter()
                .find(|p| p.spdx_id.starts_with(ROOT_PREFIX))
                .map(|p| p.spdx_id.clone())
        })
        .ok_or_else(|| {
            CatalogerError::decode("relationships", "document does not describe any element").into()
        })
}

fn decode_source(root: &SpdxPackage) -> SourceMetadata {
    let is_image = match root.primary_package_purpose.as_deref() {
        Some(purpose) => purpose == "CONTAINER",
        None => root.spdx_id.starts_with(&format!("{}Image-", ROOT_PREFIX)),
    };
    if !is_image {
        return SourceMetadata::directory(&root.name);
    }
    let id = root
        .checksums
        .iter()
        .find(|c| c.algorithm.eq_ignore_ascii_case("SHA256"))
        .map(|c| format!("sha256:{}", c.checksum_value))
        .unwrap_or_default();
    SourceMetadata::Image(ImageMetadata {
        user_input: root.name.clone(),
        id,
        manifest_digest: root.version_info.clone(),
        ..Default::default()
    })
}

fn decode_file(file: &SpdxFile) -> Location {
    let location = Location::new(&file.file_name);
    match file
        .comment
        .as_deref()
        .and_then(|c| c.strip_prefix(LAYER_COMMENT_PREFIX))
    {
        Some(digest) => location.in_layer(LayerRef::new(0, digest.trim())),
        None => location,
    }
}

fn decode_package(
    index: usize,
    spdx_package: &SpdxPackage,
    locations: Vec<Location>,
) -> Result<Package> {
    let purl = spdx_package
        .external_refs
        .iter()
        .find(|r| r.reference_type == "purl")
        .map(|r| r.reference_locator.clone());
    let package_type = purl
        .as_deref()
        .and_then(|p| p.strip_prefix("pkg:"))
        .and_then(|p| p.split('/').next())
        .map(PackageType::from_purl_type)
        .unwrap_or(PackageType::Unknown);
    let cpes: Vec<String> = spdx_package
        .external_refs
        .iter()
        .filter(|r| r.reference_type == "cpe23Type")
        .map(|r| r.reference_locator.clone())
        .collect();
    let licenses = match spdx_package.license_declared.as_str() {
        NO_ASSERTION => LicensePolicy::from_spdx_expression(&spdx_package.license_concluded),
        declared => LicensePolicy::from_spdx_expression(declared),
    };
    let found_by = spdx_package
        .source_info
        .as_deref()
        .and_then(|info| info.strip_prefix(SOURCE_INFO_PREFIX))
        .and_then(|info| info.split_once(" analyzer"))
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();

    let mut package = Package::new(&spdx_package.name, &spdx_package.version_info, package_type)
        .map_err(|e| CatalogerError::decode(format!("packages[{}].name", index), e.to_string()))?
        .with_found_by(found_by)
        .with_locations(locations)
        .with_licenses(licenses)
        .with_cpes(cpes);
    if let Some(purl) = purl {
        package = package.with_purl(purl);
    }
    if let Some(id) = package_id_from_spdx_id(&spdx_package.spdx_id) {
        package = package.with_id(id);
    }
    Ok(package)
}

/// Reads `Tool: <name>-<version>` back into a descriptor
fn decode_descriptor(creation_info: &SpdxCreationInfo) -> ToolDescriptor {
    creation_info
        .creators
        .iter()
        .find_map(|c| c.strip_prefix("Tool: "))
        .map(|tool| match tool.rsplit_once('-') {
            Some((name, version)) => ToolDescriptor::new(name, version),
            None => ToolDescriptor::new(tool, ""),
        })
        .unwrap_or_else(|| ToolDescriptor::new("", ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cataloging::domain::{DpkgFileRecord, DpkgMetadata, PackageMetadata, PythonMetadata};
    use crate::cataloging::services::RelationshipBuilder;
    use uuid::Uuid;

    fn fixed_info() -> DocumentInfo {
        DocumentInfo::new("2024-01-01T00:00:00+00:00", Uuid::nil())
    }

    fn directory_sbom(licenses: Licenses) -> Sbom {
        let observation = || {
            Package::new("pkg1", "1.0.1", PackageType::Python)
                .unwrap()
                .with_found_by("python")
                .with_location(Location::new("/some/path/pkg1"))
                .with_licenses(licenses.clone())
        };
        let catalog = Catalog::from_packages(vec![observation(), observation()]);
        let source = SourceMetadata::directory("/some/path");
        let relationships = RelationshipBuilder::build(&catalog, &source).unwrap();
        Sbom::new(catalog, relationships, source, None, ToolDescriptor::current()).unwrap()
    }

    fn encode_value(sbom: &Sbom) -> serde_json::Value {
        let json = SpdxJsonFormat::new()
            .with_document_info(fixed_info())
            .encode(sbom)
            .unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_license_sentinels() {
        let not_found = encode_value(&directory_sbom(Licenses::NotFound));
        assert_eq!(not_found["packages"][1]["licenseDeclared"], "NOASSERTION");
        assert_eq!(not_found["packages"][1]["licenseConcluded"], "NOASSERTION");

        let absent = encode_value(&directory_sbom(Licenses::ConfirmedAbsent));
        assert_eq!(absent["packages"][1]["licenseDeclared"], "NONE");

        let declared = encode_value(&directory_sbom(Licenses::from_values(["MIT", "BSD License"])));
        assert_eq!(
            declared["packages"][1]["licenseDeclared"],
            "LicenseRef-BSD-License AND MIT"
        );
    }

    #[test]
    fn test_document_header() {
        let value = encode_value(&directory_sbom(Licenses::NotFound));
        assert_eq!(value["spdxVersion"], "SPDX-2.3");
        assert_eq!(value["dataLicense"], "CC0-1.0");
        assert_eq!(value["SPDXID"], "SPDXRef-DOCUMENT");
        assert_eq!(value["creationInfo"]["created"], "2024-01-01T00:00:00+00:00");
        assert!(value["documentNamespace"]
            .as_str()
            .unwrap()
            .starts_with("https://sbom-cataloger.dev/spdxdocs/directory/some-path-"));
        assert!(value["creationInfo"]["creators"][1]
            .as_str()
            .unwrap()
            .starts_with("Tool: sbom-cataloger-"));
    }

    #[test]
    fn test_root_package_and_describes() {
        let value = encode_value(&directory_sbom(Licenses::NotFound));
        let root = &value["packages"][0];
        assert_eq!(root["SPDXID"], "SPDXRef-DocumentRoot-Directory-some-path");
        assert_eq!(root["primaryPackagePurpose"], "FILE");

        let describes = value["relationships"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["relationshipType"] == "DESCRIBES")
            .unwrap();
        assert_eq!(describes["spdxElementId"], "SPDXRef-DOCUMENT");
        assert_eq!(describes["relatedSpdxElement"], root["SPDXID"]);
    }

    #[test]
    fn test_package_identifiers_are_stable() {
        let sbom = directory_sbom(Licenses::NotFound);
        let first = encode_value(&sbom);
        let second = encode_value(&sbom);
        assert_eq!(first, second);

        let id = first["packages"][1]["SPDXID"].as_str().unwrap();
        assert!(id.starts_with("SPDXRef-Package-python-pkg1-1.0.1-"));
        assert_eq!(first["packages"][1]["externalRefs"][0]["referenceType"], "purl");
        assert_eq!(
            first["packages"][1]["externalRefs"][0]["referenceLocator"],
            "pkg:pypi/pkg1@1.0.1"
        );
    }

    #[test]
    fn test_evidence_files_listed_once() {
        let value = encode_value(&directory_sbom(Licenses::NotFound));
        let files = value["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["fileName"], "/some/path/pkg1");
    }

    #[test]
    fn test_round_trip_directory() {
        let original = directory_sbom(Licenses::ConfirmedAbsent);
        let format = SpdxJsonFormat::new();
        let decoded = format
            .decode(format.encode(&original).unwrap().as_bytes())
            .unwrap();

        assert_eq!(decoded.source(), original.source());
        let packages = decoded.catalog().sorted();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "pkg1");
        assert_eq!(packages[0].version(), "1.0.1");
        assert_eq!(packages[0].package_type(), PackageType::Python);
        assert_eq!(packages[0].found_by(), "python");
        assert_eq!(packages[0].licenses(), &Licenses::ConfirmedAbsent);
        assert_eq!(packages[0].locations().len(), 1);
        assert_eq!(decoded.relationships().len(), original.relationships().len());
        assert_eq!(decoded.descriptor(), original.descriptor());
    }

    #[test]
    fn test_round_trip_image_with_ownership() {
        let digest = "sha256:1111";
        let parent = Package::new("python3-six", "1.16.0-4", PackageType::Deb)
            .unwrap()
            .with_found_by("dpkg")
            .with_location(Location::new("/var/lib/dpkg/status").in_layer(LayerRef::new(0, digest)))
            .with_metadata(PackageMetadata::Dpkg(DpkgMetadata {
                package: "python3-six".to_string(),
                version: "1.16.0-4".to_string(),
                files: vec![DpkgFileRecord {
                    path: "/usr/lib/python3/dist-packages/six-1.16.0.dist-info/METADATA"
                        .to_string(),
                    digest: None,
                }],
                ..Default::default()
            }));
        let child = Package::new("six", "1.16.0", PackageType::Python)
            .unwrap()
            .with_found_by("python")
            .with_location(
                Location::new("/usr/lib/python3/dist-packages/six-1.16.0.dist-info/METADATA")
                    .in_layer(LayerRef::new(0, digest)),
            );
        let catalog = Catalog::from_packages(vec![parent, child]);
        let source = SourceMetadata::Image(ImageMetadata {
            user_input: "docker-archive:/tmp/app.tar".to_string(),
            id: "sha256:abcd".to_string(),
            manifest_digest: "sha256:ef01".to_string(),
            ..Default::default()
        });
        let relationships = RelationshipBuilder::build(&catalog, &source).unwrap();
        let original =
            Sbom::new(catalog, relationships, source, None, ToolDescriptor::current()).unwrap();

        let format = SpdxJsonFormat::new();
        let json = format.encode(&original).unwrap();
        assert!(json.contains("ownership-by-file-overlap"));
        let decoded = format.decode(json.as_bytes()).unwrap();

        let SourceMetadata::Image(image) = decoded.source() else {
            panic!("expected an image source");
        };
        assert_eq!(image.user_input, "docker-archive:/tmp/app.tar");
        assert_eq!(image.id, "sha256:abcd");
        assert_eq!(image.manifest_digest, "sha256:ef01");

        let summary = |sbom: &Sbom| -> Vec<(String, String, PackageType)> {
            sbom.catalog()
                .sorted()
                .iter()
                .map(|p| (p.name().to_string(), p.version().to_string(), p.package_type()))
                .collect()
        };
        assert_eq!(summary(&decoded), summary(&original));
        assert!(decoded
            .relationships()
            .iter()
            .any(|r| r.kind == RelationshipKind::OwnershipByFileOverlap));
        let located = decoded.catalog().sorted()[1].locations().iter().next().cloned().unwrap();
        assert_eq!(located.layer().unwrap().digest, digest);
    }

    #[test]
    fn test_round_trip_keeps_same_name_packages_apart() {
        let installed_in = |root: &str| {
            Package::new("six", "1.16.0", PackageType::Python)
                .unwrap()
                .with_found_by("python")
                .with_location(Location::new(format!(
                    "{}/six-1.16.0.dist-info/METADATA",
                    root
                )))
                .with_metadata(PackageMetadata::Python(PythonMetadata {
                    site_packages_root_path: Some(root.to_string()),
                    ..Default::default()
                }))
        };
        let catalog = Catalog::from_packages(vec![
            installed_in("/venv-a/lib/python3.11/site-packages"),
            installed_in("/venv-b/lib/python3.11/site-packages"),
        ]);
        let source = SourceMetadata::directory("/");
        let relationships = RelationshipBuilder::build(&catalog, &source).unwrap();
        let original =
            Sbom::new(catalog, relationships, source, None, ToolDescriptor::current()).unwrap();

        let format = SpdxJsonFormat::new();
        let decoded = format
            .decode(format.encode(&original).unwrap().as_bytes())
            .unwrap();

        let ids = |sbom: &Sbom| -> Vec<PackageId> {
            sbom.catalog().sorted().iter().map(|p| p.id().clone()).collect()
        };
        assert_eq!(decoded.catalog().len(), 2);
        assert_eq!(ids(&decoded), ids(&original));
        assert_eq!(decoded.relationships(), original.relationships());
    }

    #[test]
    fn test_package_id_from_spdx_id() {
        assert_eq!(
            package_id_from_spdx_id("SPDXRef-Package-python-six-1.16.0-0123456789abcdef"),
            Some(PackageId::from_hex("0123456789abcdef"))
        );
        assert_eq!(package_id_from_spdx_id("SPDXRef-Package-python-six-1.16.0"), None);
        assert_eq!(package_id_from_spdx_id("SPDXRef-a"), None);
    }

    #[test]
    fn test_decode_unsupported_version() {
        let document = br#"{"spdxVersion": "SPDX-3.0", "SPDXID": "SPDXRef-DOCUMENT"}"#;
        let error = SpdxJsonFormat::new().decode(document).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CatalogerError>(),
            Some(CatalogerError::UnsupportedSchema { version, .. }) if version == "SPDX-3.0"
        ));
    }

    #[test]
    fn test_decode_spdx_2_2_with_document_describes() {
        let document = br#"{
            "spdxVersion": "SPDX-2.2",
            "SPDXID": "SPDXRef-DOCUMENT",
            "creationInfo": {"created": "2024-01-01T00:00:00Z", "creators": ["Tool: other-1.0"]},
            "documentDescribes": ["SPDXRef-DocumentRoot-Directory-src"],
            "packages": [
                {"SPDXID": "SPDXRef-DocumentRoot-Directory-src", "name": "/src"},
                {"SPDXID": "SPDXRef-a", "name": "left-pad", "versionInfo": "1.3.0",
                 "licenseDeclared": "MIT",
                 "externalRefs": [{"referenceCategory": "PACKAGE-MANAGER",
                    "referenceType": "purl", "referenceLocator": "pkg:npm/left-pad@1.3.0"}]}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-DocumentRoot-Directory-src",
                 "relationshipType": "DEPENDS_ON", "relatedSpdxElement": "SPDXRef-a"}
            ]
        }"#;
        let sbom = SpdxJsonFormat::new().decode(document).unwrap();
        assert_eq!(sbom.source(), &SourceMetadata::directory("/src"));
        let packages = sbom.catalog().sorted();
        assert_eq!(packages[0].package_type(), PackageType::Npm);
        assert_eq!(packages[0].licenses(), &Licenses::from_values(["MIT"]));
        assert!(sbom.relationships().is_empty());
        assert_eq!(sbom.descriptor().name(), "other");
    }

    #[test]
    fn test_decode_dangling_element() {
        let mut value = encode_value(&directory_sbom(Licenses::NotFound));
        let relationships = value["relationships"].as_array_mut().unwrap();
        relationships[0]["relatedSpdxElement"] = "SPDXRef-missing".into();
        let error = SpdxJsonFormat::new()
            .decode(value.to_string().as_bytes())
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CatalogerError>(),
            Some(CatalogerError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("/some/path"), "some-path");
        assert_eq!(sanitize_id("@scope/pkg"), "scope-pkg");
    }
}
