use crate::cataloging::domain::{
    Endpoint, Licenses, Package, PackageId, RelationshipKind, Sbom, SourceMetadata,
};
use crate::cataloging::policies::{LicensePolicy, NONE, NO_ASSERTION};
use crate::cataloging::services::{DocumentInfo, PackageIdentifiers};
use crate::ports::outbound::DocumentEncoder;
use crate::shared::Result;
use serde::Serialize;
use std::collections::BTreeMap;

const FORMAT_ID: &str = "cyclonedx-json";
const SPEC_VERSION: &str = "1.6";
const SCHEMA_URL: &str = "http://cyclonedx.org/schema/bom-1.6.schema.json";

#[derive(Debug, Serialize)]
struct Bom {
    #[serde(rename = "$schema")]
    schema: String,
    #[serde(rename = "bomFormat")]
    bom_format: String,
    #[serde(rename = "specVersion")]
    spec_version: String,
    version: u32,
    #[serde(rename = "serialNumber")]
    serial_number: String,
    metadata: Metadata,
    components: Vec<Component>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Serialize)]
struct Dependency {
    #[serde(rename = "ref")]
    bom_ref: String,
    #[serde(rename = "dependsOn", skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tools: Tools,
    component: Component,
}

#[derive(Debug, Serialize)]
struct Tools {
    components: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct Component {
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<Vec<License>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property>,
}

#[derive(Debug, Serialize)]
struct License {
    license: LicenseContent,
}

#[derive(Debug, Serialize)]
struct LicenseContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Property {
    name: String,
    value: String,
}

/// CycloneDxJsonFormat adapter for generating CycloneDX 1.6 JSON
///
/// Encode only. Ownership edges become `dependencies`; containment and file
/// evidence are implied by the component list and its location properties,
/// so the output is not re-ingestible.
#[derive(Debug, Default, Clone)]
pub struct CycloneDxJsonFormat {
    document_info: Option<DocumentInfo>,
}

impl CycloneDxJsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses fixed creation values instead of generating them per encode
    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.document_info = Some(info);
        self
    }

    /// Build the component describing the cataloged source
    fn build_source_component(&self, source: &SourceMetadata) -> Component {
        let (component_type, version) = match source {
            SourceMetadata::Directory { .. } => ("file", String::new()),
            SourceMetadata::Image(image) => ("container", image.manifest_digest.clone()),
        };
        Component {
            bom_ref: source.id(),
            component_type: component_type.to_string(),
            name: source.name().to_string(),
            version,
            licenses: None,
            cpe: None,
            purl: None,
            properties: Vec::new(),
        }
    }

    /// Build components from the sorted catalog
    fn build_components(&self, sbom: &Sbom) -> Vec<Component> {
        sbom.catalog()
            .sorted()
            .iter()
            .map(|package| {
                let purl = package
                    .purl()
                    .map(str::to_string)
                    .unwrap_or_else(|| PackageIdentifiers::purl(package, sbom.distro()));
                Component {
                    bom_ref: package.id().to_string(),
                    component_type: "library".to_string(),
                    name: package.name().to_string(),
                    version: package.version().to_string(),
                    licenses: Some(self.build_licenses(package.licenses())),
                    cpe: package.cpes().first().cloned(),
                    purl: Some(purl),
                    properties: self.build_properties(package),
                }
            })
            .collect()
    }

    /// Declared identifiers become `id`, anything else `name`; the SPDX
    /// sentinels are written as names since CycloneDX has none of its own
    fn build_licenses(&self, licenses: &Licenses) -> Vec<License> {
        let named = |name: &str| License {
            license: LicenseContent {
                id: None,
                name: Some(name.to_string()),
            },
        };
        match licenses {
            Licenses::NotFound => vec![named(NO_ASSERTION)],
            Licenses::ConfirmedAbsent => vec![named(NONE)],
            Licenses::Declared(values) => values
                .iter()
                .map(|value| {
                    let term = LicensePolicy::spdx_term(value);
                    if term.starts_with("LicenseRef-") || term.contains(' ') {
                        named(value)
                    } else {
                        License {
                            license: LicenseContent {
                                id: Some(term),
                                name: None,
                            },
                        }
                    }
                })
                .collect(),
        }
    }

    fn build_properties(&self, package: &Package) -> Vec<Property> {
        let mut properties = vec![Property {
            name: "sbom-cataloger:package:type".to_string(),
            value: package.package_type().to_string(),
        }];
        if !package.found_by().is_empty() {
            properties.push(Property {
                name: "sbom-cataloger:package:foundBy".to_string(),
                value: package.found_by().to_string(),
            });
        }
        if !package.metadata().type_name().is_empty() {
            properties.push(Property {
                name: "sbom-cataloger:package:metadataType".to_string(),
                value: package.metadata().type_name().to_string(),
            });
        }
        for (index, location) in package.locations().iter().enumerate() {
            properties.push(Property {
                name: format!("sbom-cataloger:location:{}:path", index),
                value: location.real_path().to_string(),
            });
            if let Some(layer) = location.layer() {
                properties.push(Property {
                    name: format!("sbom-cataloger:location:{}:layerID", index),
                    value: layer.digest.clone(),
                });
            }
        }
        properties
    }

    /// Build dependencies from ownership edges, parents in catalog order
    fn build_dependencies(&self, sbom: &Sbom) -> Vec<Dependency> {
        let mut owned: BTreeMap<&PackageId, Vec<String>> = BTreeMap::new();
        for relationship in sbom.relationships() {
            if relationship.kind != RelationshipKind::OwnershipByFileOverlap {
                continue;
            }
            if let (Endpoint::Package(parent), Endpoint::Package(child)) =
                (&relationship.from, &relationship.to)
            {
                owned.entry(parent).or_default().push(child.to_string());
            }
        }

        owned
            .into_iter()
            .map(|(parent, depends_on)| Dependency {
                bom_ref: parent.to_string(),
                depends_on,
            })
            .collect()
    }
}

impl DocumentEncoder for CycloneDxJsonFormat {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn encode(&self, sbom: &Sbom) -> Result<String> {
        let info = self
            .document_info
            .clone()
            .unwrap_or_else(DocumentInfo::generate);
        let bom = Bom {
            schema: SCHEMA_URL.to_string(),
            bom_format: "CycloneDX".to_string(),
            spec_version: SPEC_VERSION.to_string(),
            version: 1,
            serial_number: info.serial_urn(),
            metadata: Metadata {
                timestamp: info.timestamp().to_string(),
                tools: Tools {
                    components: vec![Tool {
                        component_type: "application".to_string(),
                        name: sbom.descriptor().name().to_string(),
                        version: sbom.descriptor().version().to_string(),
                    }],
                },
                component: self.build_source_component(sbom.source()),
            },
            components: self.build_components(sbom),
            dependencies: self.build_dependencies(sbom),
        };

        serde_json::to_string_pretty(&bom).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cataloging::domain::{
        Catalog, DpkgFileRecord, DpkgMetadata, Location, PackageMetadata, PackageType,
        ToolDescriptor,
    };
    use crate::cataloging::services::RelationshipBuilder;
    use uuid::Uuid;

    fn create_test_sbom() -> Sbom {
        let parent = Package::new("python3-requests", "2.31.0", PackageType::Deb)
            .unwrap()
            .with_found_by("dpkg")
            .with_location(Location::new("/var/lib/dpkg/status"))
            .with_licenses(Licenses::from_values(["Apache License 2.0"]))
            .with_metadata(PackageMetadata::Dpkg(DpkgMetadata {
                package: "python3-requests".to_string(),
                version: "2.31.0".to_string(),
                files: vec![DpkgFileRecord {
                    path: "/usr/lib/python3/dist-packages/requests.egg-info/PKG-INFO".to_string(),
                    digest: None,
                }],
                ..Default::default()
            }));
        let child = Package::new("requests", "2.31.0", PackageType::Python)
            .unwrap()
            .with_found_by("python")
            .with_location(Location::new(
                "/usr/lib/python3/dist-packages/requests.egg-info/PKG-INFO",
            ));
        let catalog = Catalog::from_packages(vec![parent, child]);
        let source = SourceMetadata::directory("/rootfs");
        let relationships = RelationshipBuilder::build(&catalog, &source).unwrap();
        Sbom::new(catalog, relationships, source, None, ToolDescriptor::current()).unwrap()
    }

    fn encode(sbom: &Sbom) -> serde_json::Value {
        let json = CycloneDxJsonFormat::new()
            .with_document_info(DocumentInfo::new("2024-01-01T00:00:00Z", Uuid::nil()))
            .encode(sbom)
            .unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_format_basic() {
        let bom = encode(&create_test_sbom());
        assert_eq!(bom["bomFormat"], "CycloneDX");
        assert_eq!(bom["specVersion"], "1.6");
        assert_eq!(
            bom["serialNumber"],
            "urn:uuid:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(bom["metadata"]["timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(bom["metadata"]["tools"]["components"][0]["name"], "sbom-cataloger");
        assert_eq!(bom["metadata"]["component"]["type"], "file");
        assert_eq!(bom["metadata"]["component"]["name"], "/rootfs");
        assert_eq!(bom["components"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_format_with_license() {
        let bom = encode(&create_test_sbom());
        // deb sorts before python
        assert_eq!(bom["components"][0]["licenses"][0]["license"]["id"], "Apache-2.0");
        assert_eq!(
            bom["components"][1]["licenses"][0]["license"]["name"],
            "NOASSERTION"
        );
    }

    #[test]
    fn test_format_with_dependencies() {
        let sbom = create_test_sbom();
        let bom = encode(&sbom);
        let packages = sbom.catalog().sorted();
        assert_eq!(bom["dependencies"][0]["ref"], packages[0].id().as_str());
        assert_eq!(
            bom["dependencies"][0]["dependsOn"][0],
            packages[1].id().as_str()
        );
    }

    #[test]
    fn test_format_component_properties() {
        let bom = encode(&create_test_sbom());
        let properties = bom["components"][1]["properties"].as_array().unwrap();
        assert!(properties
            .iter()
            .any(|p| p["name"] == "sbom-cataloger:package:foundBy" && p["value"] == "python"));
        assert!(properties.iter().any(|p| p["name"] == "sbom-cataloger:location:0:path"));
        assert_eq!(bom["components"][1]["purl"], "pkg:pypi/requests@2.31.0");
    }
}
