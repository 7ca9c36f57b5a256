use super::FileResolver;
use crate::cataloging::domain::Distro;

/// DistroDetector port identifying the Linux distribution of a source
pub trait DistroDetector: Send + Sync {
    /// Returns the detected distribution, or None when nothing identifies one
    fn detect(&self, resolver: &dyn FileResolver) -> Option<Distro>;
}
