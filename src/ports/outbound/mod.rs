/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, image archives,
/// document formats, console, etc.).
pub mod distro_detector;
pub mod file_resolver;
pub mod format;
pub mod image_provider;
pub mod output_presenter;
pub mod package_analyzer;
pub mod progress_reporter;

pub use distro_detector::DistroDetector;
pub use file_resolver::FileResolver;
pub use format::{DocumentDecoder, DocumentEncoder};
pub use image_provider::ImageProvider;
pub use output_presenter::OutputPresenter;
pub use package_analyzer::PackageAnalyzer;
pub use progress_reporter::ProgressReporter;
