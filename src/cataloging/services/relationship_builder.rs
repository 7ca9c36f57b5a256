use crate::cataloging::domain::relationship::validate_relationships;
use crate::cataloging::domain::{
    clean_path, sort_relationships, Catalog, Endpoint, Package, PackageId, Relationship,
    RelationshipKind, SourceMetadata,
};
use crate::shared::error::CatalogerError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// RelationshipBuilder service deriving typed edges over a finalized catalog
///
/// This service is a pure function of its inputs: it reads the catalog
/// snapshot and never mutates it or triggers any analysis.
pub struct RelationshipBuilder;

impl RelationshipBuilder {
    /// Builds the complete, sorted relationship list
    ///
    /// Emits:
    /// - `describes` from the document root to the source
    /// - `contains` from the source to every package
    /// - `described-by` from every package to each evidencing file
    /// - `ownership-by-file-overlap` from a package whose metadata owns a
    ///   file to every other package evidenced by that file
    ///
    /// # Errors
    /// Returns `DanglingRelationship` if an edge would reference an unknown entity
    pub fn build(
        catalog: &Catalog,
        _source: &SourceMetadata,
    ) -> Result<Vec<Relationship>, CatalogerError> {
        let packages = catalog.sorted();
        let mut relationships = vec![Relationship::new(
            Endpoint::DocumentRoot,
            Endpoint::Source,
            RelationshipKind::Describes,
        )];

        for package in &packages {
            relationships.push(Relationship::new(
                Endpoint::Source,
                Endpoint::Package(package.id().clone()),
                RelationshipKind::Contains,
            ));
            for location in package.locations().iter() {
                relationships.push(Relationship::new(
                    Endpoint::Package(package.id().clone()),
                    Endpoint::File(location.coordinates()),
                    RelationshipKind::DescribedBy,
                ));
            }
        }

        relationships.extend(Self::ownership_by_file_overlap(&packages));

        sort_relationships(&mut relationships);
        validate_relationships(&relationships, catalog)?;
        Ok(relationships)
    }

    fn ownership_by_file_overlap(packages: &[Package]) -> Vec<Relationship> {
        let mut evidenced_by: HashMap<&str, Vec<&Package>> = HashMap::new();
        for package in packages {
            for location in package.locations().iter() {
                evidenced_by
                    .entry(location.real_path())
                    .or_default()
                    .push(package);
            }
        }

        let mut relationships = Vec::new();
        for parent in packages {
            let owned = parent.metadata().owned_files();
            if owned.is_empty() {
                continue;
            }

            let mut overlaps: BTreeMap<&PackageId, BTreeSet<String>> = BTreeMap::new();
            for file in owned {
                let file = clean_path(file);
                let Some(children) = evidenced_by.get(file.as_str()) else {
                    continue;
                };
                for child in children.iter().filter(|c| c.id() != parent.id()) {
                    overlaps.entry(child.id()).or_default().insert(file.clone());
                }
            }

            for (child_id, files) in overlaps {
                relationships.push(
                    Relationship::new(
                        Endpoint::Package(parent.id().clone()),
                        Endpoint::Package(child_id.clone()),
                        RelationshipKind::OwnershipByFileOverlap,
                    )
                    .with_metadata(serde_json::json!({ "files": files })),
                );
            }
        }
        relationships
    }
}
