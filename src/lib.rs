//! sbom-cataloger - package cataloging for directories and container images
//!
//! This library discovers software packages in a source (a directory or a
//! layered container image), deduplicates them into a catalog, derives the
//! relationships between packages, files and the source, and encodes the
//! result as a native JSON, SPDX 2.3 or CycloneDX 1.6 document.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`cataloging`): Packages, the catalog, relationships and policies
//! - **Application Layer** (`application`): Use cases, DTOs, factories and source resolution
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Analyzers, resolvers, image providers and document formats
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use sbom_cataloger::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let use_case = CatalogSourceUseCase::new(
//!     vec![
//!         Arc::new(DpkgAnalyzer::new()) as Arc<dyn PackageAnalyzer>,
//!         Arc::new(PythonPackageAnalyzer::new()),
//!     ],
//!     Arc::new(OsReleaseDetector::new()),
//!     StderrProgressReporter::new(),
//!     SourceOptions::default(),
//! );
//!
//! let request = CatalogRequest::new("docker-archive:app.tar", Scope::Squashed, OutputFormat::SpdxJson);
//! let response = use_case.execute(request).await?;
//! println!("{}", response.document);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cataloging;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::analyzers::{DpkgAnalyzer, PythonPackageAnalyzer};
    pub use crate::adapters::outbound::console::{QuietProgressReporter, StderrProgressReporter};
    pub use crate::adapters::outbound::distro::OsReleaseDetector;
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::formats::{
        CycloneDxJsonFormat, NativeJsonFormat, SpdxJsonFormat,
    };
    pub use crate::adapters::outbound::image::DockerArchiveProvider;
    pub use crate::application::dto::{CatalogRequest, CatalogResponse, OutputFormat};
    pub use crate::application::factories::FormatFactory;
    pub use crate::application::source::{Source, SourceOptions};
    pub use crate::application::use_cases::{CatalogSourceUseCase, ConvertDocumentUseCase};
    pub use crate::cataloging::domain::{
        Catalog, Distro, Licenses, Location, Package, PackageType, Relationship,
        RelationshipKind, Sbom, Scope, SourceMetadata, ToolDescriptor,
    };
    pub use crate::cataloging::services::RelationshipBuilder;
    pub use crate::ports::inbound::{CatalogingPort, ConversionPort};
    pub use crate::ports::outbound::{
        DistroDetector, DocumentDecoder, DocumentEncoder, FileResolver, ImageProvider,
        OutputPresenter, PackageAnalyzer, ProgressReporter,
    };
    pub use crate::shared::error::CatalogerError;
    pub use crate::shared::Result;
}
