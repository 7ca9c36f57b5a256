use super::FileResolver;
use crate::cataloging::domain::Package;
use crate::shared::Result;

/// PackageAnalyzer port: discovers packages of one ecosystem
///
/// Analyzers only read through the resolver they are given. Each returned
/// package carries the locations that evidenced it; the catalog takes care
/// of deduplication, so analyzers may return the same package twice.
pub trait PackageAnalyzer: Send + Sync {
    /// Stable analyzer name, recorded as `found_by` and used for selection
    fn name(&self) -> &str;

    /// Analyzes the resolver's view and returns the packages found
    ///
    /// # Errors
    /// Returns an error when the analyzer cannot complete; siblings keep running
    fn analyze(&self, resolver: &dyn FileResolver) -> Result<Vec<Package>>;
}
