/// Mock implementations for testing
mod mock_analyzer;
mod mock_distro_detector;
mod mock_progress_reporter;

pub use mock_analyzer::{FailingAnalyzer, MockAnalyzer};
pub use mock_distro_detector::MockDistroDetector;
pub use mock_progress_reporter::MockProgressReporter;
