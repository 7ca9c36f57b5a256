use crate::cataloging::domain::{
    Catalog, Coordinates, Distro, Endpoint, ImageMetadata, LayerMetadata, LayerRef, Licenses,
    Location, Package, PackageId, PackageMetadata, PackageType, Relationship, RelationshipKind,
    Sbom, SourceMetadata, ToolDescriptor,
};
use crate::cataloging::policies::NONE;
use crate::ports::outbound::{DocumentDecoder, DocumentEncoder};
use crate::shared::error::CatalogerError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current native schema version
pub const SCHEMA_VERSION: &str = "1.1.0";

/// Major version the decoder understands
const SUPPORTED_MAJOR: &str = "1";

const FORMAT_ID: &str = "json";

/// Endpoint id used for the synthetic document root
const DOCUMENT_ROOT_ID: &str = "DocumentRoot";

fn schema_url(version: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/sbom-cataloger/sbom-cataloger/main/schema/json/schema-{}.json",
        version
    )
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    artifacts: Vec<Artifact>,
    #[serde(default)]
    artifact_relationships: Vec<ArtifactRelationship>,
    source: DocumentSource,
    #[serde(default)]
    distro: DocumentDistro,
    descriptor: Descriptor,
    schema: Schema,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    id: String,
    name: String,
    version: String,
    #[serde(rename = "type")]
    package_type: String,
    #[serde(default)]
    found_by: String,
    #[serde(default)]
    locations: Vec<DocumentLocation>,
    #[serde(default)]
    licenses: Vec<String>,
    // absent in 1.0.x documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default)]
    cpes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default)]
    metadata_type: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    metadata: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentLocation {
    path: String,
    #[serde(rename = "layerID", default, skip_serializing_if = "Option::is_none")]
    layer_id: Option<String>,
    // layers can share a digest, so the position is written too
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layer_index: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactRelationship {
    parent: String,
    child: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentSource {
    id: String,
    #[serde(rename = "type")]
    scheme: String,
    target: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageTarget {
    user_input: String,
    #[serde(rename = "imageID", default)]
    image_id: String,
    #[serde(default)]
    manifest_digest: String,
    #[serde(default)]
    media_type: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(rename = "imageSize", default)]
    size: u64,
    #[serde(default)]
    layers: Vec<ImageLayer>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLayer {
    #[serde(default)]
    media_type: String,
    digest: String,
    #[serde(default)]
    size: u64,
}

/// An undetected distro is written with empty fields, never omitted
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentDistro {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    id_like: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pretty_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Descriptor {
    name: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Schema {
    version: String,
    url: String,
}

/// NativeJsonFormat adapter for the tool's own lossless JSON document
///
/// Packages keep their ecosystem metadata and found-by analyzer, so decoding
/// reproduces the same package ids. Only virtual paths are not written.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeJsonFormat;

impl NativeJsonFormat {
    pub fn new() -> Self {
        Self
    }

    fn build_artifact(&self, package: &Package) -> Artifact {
        let licenses = match package.licenses() {
            Licenses::NotFound => Vec::new(),
            Licenses::ConfirmedAbsent => vec![NONE.to_string()],
            Licenses::Declared(values) => values.iter().cloned().collect(),
        };
        Artifact {
            id: package.id().to_string(),
            name: package.name().to_string(),
            version: package.version().to_string(),
            package_type: package.package_type().to_string(),
            found_by: package.found_by().to_string(),
            locations: package
                .locations()
                .iter()
                .map(|location| DocumentLocation {
                    path: location.real_path().to_string(),
                    layer_id: location.layer().map(|l| l.digest.clone()),
                    layer_index: location.layer().map(|l| l.index),
                })
                .collect(),
            licenses,
            language: package.language().map(str::to_string),
            cpes: package.cpes().to_vec(),
            purl: package.purl().map(str::to_string),
            metadata_type: package.metadata().type_name().to_string(),
            metadata: package.metadata().to_json(),
        }
    }

    fn build_source(&self, source: &SourceMetadata) -> Result<DocumentSource> {
        let target = match source {
            SourceMetadata::Directory { path } => serde_json::Value::String(path.clone()),
            SourceMetadata::Image(image) => serde_json::to_value(ImageTarget {
                user_input: image.user_input.clone(),
                image_id: image.id.clone(),
                manifest_digest: image.manifest_digest.clone(),
                media_type: image.media_type.clone(),
                tags: image.tags.clone(),
                size: image.size,
                layers: image
                    .layers
                    .iter()
                    .map(|layer| ImageLayer {
                        media_type: layer.media_type.clone(),
                        digest: layer.digest.clone(),
                        size: layer.size,
                    })
                    .collect(),
            })?,
        };
        Ok(DocumentSource {
            id: source.id(),
            scheme: source.scheme().to_string(),
            target,
        })
    }

    fn endpoint_id(&self, endpoint: &Endpoint, source_id: &str) -> String {
        match endpoint {
            Endpoint::DocumentRoot => DOCUMENT_ROOT_ID.to_string(),
            Endpoint::Source => source_id.to_string(),
            Endpoint::Package(id) => id.to_string(),
            Endpoint::File(coordinates) => coordinates.id(),
        }
    }
}

impl DocumentEncoder for NativeJsonFormat {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn encode(&self, sbom: &Sbom) -> Result<String> {
        let source = self.build_source(sbom.source())?;
        let artifact_relationships = sbom
            .relationships()
            .iter()
            .map(|r| ArtifactRelationship {
                parent: self.endpoint_id(&r.from, &source.id),
                child: self.endpoint_id(&r.to, &source.id),
                kind: r.kind.to_string(),
                metadata: r.metadata.clone(),
            })
            .collect();

        let document = Document {
            artifacts: sbom
                .catalog()
                .sorted()
                .iter()
                .map(|p| self.build_artifact(p))
                .collect(),
            artifact_relationships,
            source,
            distro: sbom
                .distro()
                .map(|d| DocumentDistro {
                    name: d.name.clone(),
                    version: d.version.clone(),
                    id_like: d.id_like.clone(),
                    pretty_name: d.pretty_name.clone(),
                })
                .unwrap_or_default(),
            descriptor: Descriptor {
                name: sbom.descriptor().name().to_string(),
                version: sbom.descriptor().version().to_string(),
            },
            schema: Schema {
                version: SCHEMA_VERSION.to_string(),
                url: schema_url(SCHEMA_VERSION),
            },
        };

        serde_json::to_string_pretty(&document).map_err(Into::into)
    }
}

impl DocumentDecoder for NativeJsonFormat {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn identify(&self, document: &[u8]) -> bool {
        serde_json::from_slice::<serde_json::Value>(document)
            .map(|value| value.get("artifacts").is_some() && value.get("schema").is_some())
            .unwrap_or(false)
    }

    fn decode(&self, document: &[u8]) -> Result<Sbom> {
        let value = super::parse_json(document)?;
        check_schema_version(&value)?;
        let document: Document = serde_json::from_value(value)
            .map_err(|e| CatalogerError::decode("document", e.to_string()))?;

        let source = decode_source(&document.source)?;
        // digest -> lowest layer carrying it, for documents without layerIndex
        let mut layer_index: HashMap<&str, usize> = HashMap::new();
        if let SourceMetadata::Image(image) = &source {
            for layer in &image.layers {
                layer_index.entry(layer.digest.as_str()).or_insert(layer.index);
            }
        }

        // document id -> recomputed id, and coordinates id -> coordinates
        let mut package_ids: HashMap<&str, PackageId> = HashMap::new();
        let mut files: HashMap<String, Coordinates> = HashMap::new();
        let catalog = Catalog::new();
        for (index, artifact) in document.artifacts.iter().enumerate() {
            let package = decode_artifact(index, artifact, &layer_index)?;
            for coordinates in package.locations().coordinates() {
                files.insert(coordinates.id(), coordinates);
            }
            package_ids.insert(artifact.id.as_str(), package.id().clone());
            catalog.add(package);
        }

        let resolve = |field: String, id: &str| -> Result<Endpoint> {
            if id == DOCUMENT_ROOT_ID {
                Ok(Endpoint::DocumentRoot)
            } else if id == document.source.id {
                Ok(Endpoint::Source)
            } else if let Some(package_id) = package_ids.get(id) {
                Ok(Endpoint::Package(package_id.clone()))
            } else if let Some(coordinates) = files.get(id) {
                Ok(Endpoint::File(coordinates.clone()))
            } else {
                Err(CatalogerError::decode(field, format!("unknown element id '{}'", id)).into())
            }
        };

        let mut relationships = Vec::with_capacity(document.artifact_relationships.len());
        for (index, r) in document.artifact_relationships.iter().enumerate() {
            let field = format!("artifactRelationships[{}]", index);
            let kind: RelationshipKind = r
                .kind
                .parse()
                .map_err(|e: String| CatalogerError::decode(format!("{}.type", field), e))?;
            let mut relationship = Relationship::new(
                resolve(format!("{}.parent", field), &r.parent)?,
                resolve(format!("{}.child", field), &r.child)?,
                kind,
            );
            relationship.metadata = r.metadata.clone();
            relationships.push(relationship);
        }

        let distro = Some(&document.distro)
            .filter(|d| !d.name.is_empty())
            .map(|d| Distro {
                name: d.name.clone(),
                version: d.version.clone(),
                id_like: d.id_like.clone(),
                pretty_name: d.pretty_name.clone(),
            });

        let sbom = Sbom::new(
            catalog,
            relationships,
            source,
            distro,
            ToolDescriptor::new(&document.descriptor.name, &document.descriptor.version),
        )?;
        Ok(sbom)
    }
}

fn check_schema_version(value: &serde_json::Value) -> Result<()> {
    let version = value
        .get("schema")
        .and_then(|s| s.get("version"))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CatalogerError::decode("schema.version", "missing schema version"))?;

    if version.split('.').next() != Some(SUPPORTED_MAJOR) {
        return Err(CatalogerError::UnsupportedSchema {
            format: FORMAT_ID.to_string(),
            version: version.to_string(),
        }
        .into());
    }
    Ok(())
}

fn decode_source(source: &DocumentSource) -> Result<SourceMetadata> {
    match source.scheme.as_str() {
        "directory" => source
            .target
            .as_str()
            .map(SourceMetadata::directory)
            .ok_or_else(|| {
                CatalogerError::decode("source.target", "expected a directory path").into()
            }),
        "image" => {
            let target: ImageTarget = serde_json::from_value(source.target.clone())
                .map_err(|e| CatalogerError::decode("source.target", e.to_string()))?;
            Ok(SourceMetadata::Image(ImageMetadata {
                user_input: target.user_input,
                id: target.image_id,
                manifest_digest: target.manifest_digest,
                media_type: target.media_type,
                tags: target.tags,
                size: target.size,
                layers: target
                    .layers
                    .into_iter()
                    .enumerate()
                    .map(|(index, layer)| LayerMetadata {
                        index,
                        digest: layer.digest,
                        media_type: layer.media_type,
                        size: layer.size,
                    })
                    .collect(),
            }))
        }
        other => Err(CatalogerError::decode(
            "source.type",
            format!("unknown source type '{}'", other),
        )
        .into()),
    }
}

fn decode_artifact(
    index: usize,
    artifact: &Artifact,
    layer_index: &HashMap<&str, usize>,
) -> Result<Package> {
    let field = |name: &str| format!("artifacts[{}].{}", index, name);

    let package_type: PackageType = artifact
        .package_type
        .parse()
        .map_err(|e: String| CatalogerError::decode(field("type"), e))?;
    let metadata = PackageMetadata::from_json(&artifact.metadata_type, artifact.metadata.clone())
        .map_err(|e| CatalogerError::decode(field("metadata"), e))?;
    let licenses = match artifact.licenses.as_slice() {
        [only] if only == NONE => Licenses::ConfirmedAbsent,
        values => Licenses::from_values(values),
    };
    let locations = artifact.locations.iter().map(|l| {
        let location = Location::new(&l.path);
        match &l.layer_id {
            Some(digest) => location.in_layer(LayerRef::new(
                l.layer_index
                    .or_else(|| layer_index.get(digest.as_str()).copied())
                    .unwrap_or_default(),
                digest.clone(),
            )),
            None => location,
        }
    });

    let mut package = Package::new(&artifact.name, &artifact.version, package_type)
        .map_err(|e| CatalogerError::decode(field("name"), e.to_string()))?
        .with_found_by(&artifact.found_by)
        .with_locations(locations)
        .with_licenses(licenses)
        .with_cpes(artifact.cpes.clone())
        .with_metadata(metadata);
    if artifact.language.is_some() {
        package = package.with_language(artifact.language.clone());
    }
    if let Some(purl) = &artifact.purl {
        package = package.with_purl(purl);
    }
    Ok(package)
}
