use super::{Catalog, Coordinates, PackageId};
use crate::shared::error::CatalogerError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Kind of a directed relationship
///
/// Variants are declared in lexical order of their tags so the derived
/// ordering matches the documented sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipKind {
    /// A source contains a package
    Contains,
    /// A package's existence is described by (evident from) a file
    DescribedBy,
    /// The document root describes the source
    Describes,
    /// A package owns files that are evidence for another package
    OwnershipByFileOverlap,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Contains => "contains",
            RelationshipKind::DescribedBy => "described-by",
            RelationshipKind::Describes => "describes",
            RelationshipKind::OwnershipByFileOverlap => "ownership-by-file-overlap",
        }
    }
}

impl FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(RelationshipKind::Contains),
            "described-by" => Ok(RelationshipKind::DescribedBy),
            "describes" => Ok(RelationshipKind::Describes),
            "ownership-by-file-overlap" => Ok(RelationshipKind::OwnershipByFileOverlap),
            other => Err(format!("unknown relationship type: {}", other)),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// The synthetic root of the document
    DocumentRoot,
    /// The cataloged source
    Source,
    Package(PackageId),
    File(Coordinates),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::DocumentRoot => write!(f, "document-root"),
            Endpoint::Source => write!(f, "source"),
            Endpoint::Package(id) => write!(f, "package:{}", id),
            Endpoint::File(coordinates) => write!(f, "file:{}", coordinates),
        }
    }
}

/// Relationship value object: a typed edge between two entities
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub from: Endpoint,
    pub to: Endpoint,
    pub kind: RelationshipKind,
    pub metadata: Option<serde_json::Value>,
}

impl Relationship {
    pub fn new(from: Endpoint, to: Endpoint, kind: RelationshipKind) -> Self {
        Self {
            from,
            to,
            kind,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Sorts relationships by kind, then source endpoint, then target endpoint
pub fn sort_relationships(relationships: &mut [Relationship]) {
    relationships.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
}

/// Checks that every endpoint resolves to the document root, the source,
/// a cataloged package, or a file evidencing a cataloged package
///
/// # Errors
/// Returns `DanglingRelationship` for the first endpoint that does not resolve
pub fn validate_relationships(
    relationships: &[Relationship],
    catalog: &Catalog,
) -> Result<(), CatalogerError> {
    let packages = catalog.sorted();
    let package_ids: HashSet<&PackageId> = packages.iter().map(|p| p.id()).collect();
    let files: HashSet<Coordinates> = packages
        .iter()
        .flat_map(|p| p.locations().coordinates())
        .collect();

    let known = |endpoint: &Endpoint| match endpoint {
        Endpoint::DocumentRoot | Endpoint::Source => true,
        Endpoint::Package(id) => package_ids.contains(id),
        Endpoint::File(coordinates) => files.contains(coordinates),
    };

    for relationship in relationships {
        for endpoint in [&relationship.from, &relationship.to] {
            if !known(endpoint) {
                return Err(CatalogerError::DanglingRelationship {
                    kind: relationship.kind.to_string(),
                    endpoint: endpoint.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cataloging::domain::{Location, Package, PackageType};

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            RelationshipKind::Contains,
            RelationshipKind::DescribedBy,
            RelationshipKind::Describes,
            RelationshipKind::OwnershipByFileOverlap,
        ] {
            assert_eq!(kind.as_str().parse::<RelationshipKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_order_is_lexical() {
        assert!(RelationshipKind::Contains < RelationshipKind::DescribedBy);
        assert!(RelationshipKind::DescribedBy < RelationshipKind::Describes);
        assert!(RelationshipKind::Describes < RelationshipKind::OwnershipByFileOverlap);
    }

    #[test]
    fn test_validate_accepts_known_endpoints() {
        let package = Package::new("pkg1", "1.0.1", PackageType::Python)
            .unwrap()
            .with_location(Location::new("/some/path/pkg1"));
        let id = package.id().clone();
        let catalog = Catalog::from_packages(vec![package]);

        let relationships = vec![
            Relationship::new(Endpoint::DocumentRoot, Endpoint::Source, RelationshipKind::Describes),
            Relationship::new(
                Endpoint::Source,
                Endpoint::Package(id.clone()),
                RelationshipKind::Contains,
            ),
            Relationship::new(
                Endpoint::Package(id),
                Endpoint::File(Coordinates::new("/some/path/pkg1", None)),
                RelationshipKind::DescribedBy,
            ),
        ];
        assert!(validate_relationships(&relationships, &catalog).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_file() {
        let package = Package::new("pkg1", "1.0.1", PackageType::Python).unwrap();
        let id = package.id().clone();
        let catalog = Catalog::from_packages(vec![package]);

        let relationships = vec![Relationship::new(
            Endpoint::Package(id),
            Endpoint::File(Coordinates::new("/nowhere", None)),
            RelationshipKind::DescribedBy,
        )];
        let error = validate_relationships(&relationships, &catalog).unwrap_err();
        assert!(matches!(error, CatalogerError::DanglingRelationship { .. }));
        assert!(error.to_string().contains("/nowhere"));
    }
}
