pub mod document_info;
pub mod glob_pattern;
pub mod package_identifiers;
pub mod relationship_builder;

pub use document_info::DocumentInfo;
pub use glob_pattern::GlobPattern;
pub use package_identifiers::PackageIdentifiers;
pub use relationship_builder::RelationshipBuilder;
