use crate::application::dto::{CatalogRequest, CatalogResponse};
use crate::application::factories::FormatFactory;
use crate::application::source::{Source, SourceOptions};
use crate::cataloging::domain::{Catalog, Distro, Package, Sbom, ToolDescriptor};
use crate::cataloging::services::{PackageIdentifiers, RelationshipBuilder};
use crate::ports::inbound::CatalogingPort;
use crate::ports::outbound::{DistroDetector, FileResolver, PackageAnalyzer, ProgressReporter};
use crate::shared::error::CatalogerError;
use crate::shared::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;


/// Outcome of a single analyzer run, kept in registration order
type AnalyzerOutcome = (String, std::result::Result<Vec<Package>, String>);

/// CatalogSourceUseCase - Core use case for cataloging a source
///
/// Opens the source, runs every selected analyzer against one shared
/// resolver, merges their observations into a deduplicated catalog and
/// encodes the resulting sbom.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct CatalogSourceUseCase<PR> {
    analyzers: Vec<Arc<dyn PackageAnalyzer>>,
    distro_detector: Arc<dyn DistroDetector>,
    progress_reporter: PR,
    source_options: SourceOptions,
    descriptor: ToolDescriptor,
}

impl<PR> CatalogSourceUseCase<PR>
where
    PR: ProgressReporter,
{
    /// Creates a new CatalogSourceUseCase with injected dependencies
    ///
    /// Analyzer results are merged in the order the analyzers are given
    /// here, whatever order they finish in.
    pub fn new(
        analyzers: Vec<Arc<dyn PackageAnalyzer>>,
        distro_detector: Arc<dyn DistroDetector>,
        progress_reporter: PR,
        source_options: SourceOptions,
    ) -> Self {
        Self {
            analyzers,
            distro_detector,
            progress_reporter,
            source_options,
            descriptor: ToolDescriptor::current(),
        }
    }

    /// Overrides the tool descriptor recorded in produced documents
    pub fn with_descriptor(mut self, descriptor: ToolDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Executes the cataloging use case
    ///
    /// # Arguments
    /// * `request` - Source input, scope, output format and analyzer selection
    ///
    /// # Returns
    /// CatalogResponse holding the sbom, its encoded document and any warnings
    pub async fn execute(&self, request: CatalogRequest) -> Result<CatalogResponse> {
        // Step 1: Select analyzers before touching the source
        let analyzers = self.select_analyzers(&request)?;

        // Step 2: Open the source and build the resolver for the scope
        let source = self.open_source(&request).await?;
        let resolver = source.file_resolver(request.scope)?;

        // Step 3: Detect the distribution
        let distro = self.detect_distro(&resolver);
        self.check_cancelled("cataloging")?;

        // Step 4: Run analyzers in parallel
        let outcomes = self.run_analyzers(analyzers, &resolver).await?;

        // Step 5: Merge observations in registration order
        let mut warnings = Vec::new();
        let catalog = self.merge_observations(outcomes, distro.as_ref(), &mut warnings);
        warnings.extend(catalog.conflicts().into_iter().map(CatalogerError::from));

        // Step 6: Derive relationships and assemble the sbom
        let relationships = RelationshipBuilder::build(&catalog, source.metadata())?;
        let sbom = Sbom::new(
            catalog,
            relationships,
            source.metadata().clone(),
            distro,
            self.descriptor.clone(),
        )?;

        // Step 7: Encode the requested format
        self.progress_reporter
            .report(FormatFactory::progress_message(request.format));
        let document = FormatFactory::encoder(request.format).encode(&sbom)?;

        self.progress_reporter.report_completion(&format!(
            "✅ Cataloged {} package(s) and {} relationship(s)",
            sbom.catalog().len(),
            sbom.relationships().len()
        ));

        Ok(CatalogResponse::new(sbom, document, warnings))
    }

    /// Resolves the analyzer selection of the request
    ///
    /// # Errors
    /// Returns `InvalidConfig` when a requested analyzer is not registered
    fn select_analyzers(&self, request: &CatalogRequest) -> Result<Vec<Arc<dyn PackageAnalyzer>>> {
        if let Some(names) = &request.analyzers {
            let unknown: Vec<&str> = names
                .iter()
                .map(String::as_str)
                .filter(|name| {
                    !self
                        .analyzers
                        .iter()
                        .any(|a| a.name().eq_ignore_ascii_case(name))
                })
                .collect();
            if !unknown.is_empty() {
                let available: Vec<&str> = self.analyzers.iter().map(|a| a.name()).collect();
                return Err(CatalogerError::InvalidConfig {
                    message: format!("unknown analyzer(s): {}", unknown.join(", ")),
                    hint: format!("Available analyzers: {}", available.join(", ")),
                }
                .into());
            }
        }

        Ok(self
            .analyzers
            .iter()
            .filter(|a| request.is_enabled(a.name()))
            .cloned()
            .collect())
    }

    /// Opens the source on a blocking thread, reporting progress
    async fn open_source(&self, request: &CatalogRequest) -> Result<Source> {
        self.progress_reporter
            .report(&format!("📦 Opening source: {}", request.input));

        let input = request.input.clone();
        let options = self.source_options.clone();
        let source = tokio::task::spawn_blocking(move || Source::new(&input, &options)).await??;

        tracing::info!(
            scheme = %source.metadata().scheme(),
            name = %source.metadata().name(),
            scope = %request.scope,
            "source opened"
        );
        Ok(source)
    }

    fn detect_distro(&self, resolver: &Arc<dyn FileResolver>) -> Option<Distro> {
        let distro = self.distro_detector.detect(resolver.as_ref());
        match &distro {
            Some(distro) => {
                tracing::info!(distro = %distro.name, version = %distro.version, "distro detected");
                self.progress_reporter.report(&format!(
                    "🐧 Detected distribution: {} {}",
                    distro.name, distro.version
                ));
            }
            None => tracing::debug!("no distro detected"),
        }
        distro
    }

    /// Runs analyzers on blocking threads and waits for all of them
    ///
    /// Returns outcomes in the order of `analyzers`. Cancellation while
    /// waiting abandons the remaining results.
    async fn run_analyzers(
        &self,
        analyzers: Vec<Arc<dyn PackageAnalyzer>>,
        resolver: &Arc<dyn FileResolver>,
    ) -> Result<Vec<AnalyzerOutcome>> {
        self.progress_reporter.report(&format!(
            "🔍 Running {} analyzer(s)...",
            analyzers.len()
        ));

        let handles: Vec<_> = analyzers
            .into_iter()
            .map(|analyzer| {
                let resolver = Arc::clone(resolver);
                let name = analyzer.name().to_string();
                let handle = tokio::task::spawn_blocking(move || {
                    analyzer
                        .analyze(resolver.as_ref())
                        .map_err(|e| format!("{:#}", e))
                });
                (name, handle)
            })
            .collect();

        let (names, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
        let cancel = self.source_options.cancel.clone();
        let joined = tokio::select! {
            results = join_all(handles) => results,
            _ = cancel.cancelled() => {
                return Err(CatalogerError::Cancelled {
                    operation: "analysis".to_string(),
                }
                .into());
            }
        };

        Ok(names
            .into_iter()
            .zip(joined)
            .map(|(name, joined)| {
                let outcome = joined.unwrap_or_else(|e| Err(format!("analyzer task failed: {}", e)));
                (name, outcome)
            })
            .collect())
    }

    /// Normalizes identifiers and adds every observation to a fresh catalog
    fn merge_observations(
        &self,
        outcomes: Vec<AnalyzerOutcome>,
        distro: Option<&Distro>,
        warnings: &mut Vec<CatalogerError>,
    ) -> Catalog {
        let catalog = Catalog::new();
        let total = outcomes.len();

        for (index, (name, outcome)) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(packages) => {
                    tracing::debug!(analyzer = %name, packages = packages.len(), "analyzer finished");
                    self.progress_reporter.report_progress(
                        index + 1,
                        total,
                        Some(&format!("{}: {} package(s)", name, packages.len())),
                    );
                    for package in packages {
                        catalog.add(PackageIdentifiers::normalize(package, distro));
                    }
                }
                Err(details) => {
                    tracing::warn!(analyzer = %name, error = %details, "analyzer failed");
                    self.progress_reporter
                        .report_error(&format!("⚠️  Analyzer '{}' failed: {}", name, details));
                    warnings.push(CatalogerError::AnalyzerFailure {
                        analyzer: name,
                        details,
                    });
                }
            }
        }

        catalog
    }

    fn check_cancelled(&self, operation: &str) -> Result<()> {
        if self.source_options.cancel.is_cancelled() {
            return Err(CatalogerError::Cancelled {
                operation: operation.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl<PR> CatalogingPort for CatalogSourceUseCase<PR>
where
    PR: ProgressReporter,
{
    async fn catalog(&self, request: CatalogRequest) -> Result<CatalogResponse> {
        self.execute(request).await
    }
}
