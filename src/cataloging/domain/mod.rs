pub mod catalog;
pub mod descriptor;
pub mod identity;
pub mod image;
pub mod licenses;
pub mod location;
pub mod metadata;
pub mod package;
pub mod package_type;
pub mod relationship;
pub mod sbom;
pub mod source_metadata;

pub use catalog::{AddOutcome, Catalog, IdentityConflict};
pub use descriptor::{Distro, ToolDescriptor};
pub use image::{EntryKind, Image, Layer, LayerEntry};
pub use licenses::Licenses;
pub use location::{clean_path, Coordinates, LayerRef, Location, LocationSet};
pub use metadata::{
    DpkgFileRecord, DpkgMetadata, PackageMetadata, PythonFileRecord, PythonMetadata,
};
pub use package::{Package, PackageId};
pub use package_type::PackageType;
pub use relationship::{sort_relationships, Endpoint, Relationship, RelationshipKind};
pub use sbom::Sbom;
pub use source_metadata::{ImageMetadata, LayerMetadata, Scheme, Scope, SourceMetadata};
