use super::relationship::validate_relationships;
use super::{Catalog, Distro, Relationship, SourceMetadata, ToolDescriptor};
use crate::shared::error::CatalogerError;

/// Sbom aggregate: everything a document encodes, independent of format
///
/// Encoders read it, decoders rebuild it. Construction validates that the
/// relationships only reference entities present in the catalog or source.
#[derive(Debug)]
pub struct Sbom {
    catalog: Catalog,
    relationships: Vec<Relationship>,
    source: SourceMetadata,
    distro: Option<Distro>,
    descriptor: ToolDescriptor,
}

impl Sbom {
    pub fn new(
        catalog: Catalog,
        relationships: Vec<Relationship>,
        source: SourceMetadata,
        distro: Option<Distro>,
        descriptor: ToolDescriptor,
    ) -> Result<Self, CatalogerError> {
        validate_relationships(&relationships, &catalog)?;
        Ok(Self {
            catalog,
            relationships,
            source,
            distro,
            descriptor,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn source(&self) -> &SourceMetadata {
        &self.source
    }

    pub fn distro(&self) -> Option<&Distro> {
        self.distro.as_ref()
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }
}
