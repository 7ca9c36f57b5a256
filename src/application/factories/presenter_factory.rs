use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use crate::ports::outbound::OutputPresenter;
use std::path::PathBuf;

/// Where an encoded document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterType {
    Stdout,
    File(PathBuf),
}

impl PresenterType {
    /// File output when a path was given, stdout otherwise
    pub fn from_output(path: Option<PathBuf>) -> Self {
        path.map_or(PresenterType::Stdout, PresenterType::File)
    }
}

/// Factory for creating output presenters
///
/// Keeps the choice of output adapter out of the CLI so every command
/// writes documents the same way.
pub struct PresenterFactory;

impl PresenterFactory {
    /// Creates a presenter instance for the specified type
    ///
    /// # Examples
    /// ```
    /// use sbom_cataloger::application::factories::{PresenterFactory, PresenterType};
    ///
    /// let presenter = PresenterFactory::create(PresenterType::from_output(None));
    /// ```
    pub fn create(presenter_type: PresenterType) -> Box<dyn OutputPresenter> {
        match presenter_type {
            PresenterType::Stdout => Box::new(StdoutPresenter::new()),
            PresenterType::File(path) => Box::new(FileSystemWriter::new(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_output() {
        assert_eq!(PresenterType::from_output(None), PresenterType::Stdout);
        assert_eq!(
            PresenterType::from_output(Some(PathBuf::from("sbom.json"))),
            PresenterType::File(PathBuf::from("sbom.json"))
        );
    }

    #[test]
    fn test_file_presenter_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sbom.spdx.json");
        let presenter = PresenterFactory::create(PresenterType::File(path.clone()));

        presenter.present("{\"spdxVersion\":\"SPDX-2.3\"}").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("SPDX-2.3"));
    }
}
