use super::OutputFormat;
use crate::cataloging::domain::Scope;

/// CatalogRequest - Internal request DTO for the cataloging use case
#[derive(Debug, Clone)]
pub struct CatalogRequest {
    /// Source input, e.g. `dir:/rootfs` or `docker-archive:app.tar`
    pub input: String,
    /// Resolver scope for image sources
    pub scope: Scope,
    /// Document format to encode the result in
    pub format: OutputFormat,
    /// Names of the analyzers to run; `None` runs every registered analyzer
    pub analyzers: Option<Vec<String>>,
}

impl CatalogRequest {
    pub fn new(input: impl Into<String>, scope: Scope, format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            scope,
            format,
            analyzers: None,
        }
    }

    pub fn with_analyzers(mut self, analyzers: Vec<String>) -> Self {
        self.analyzers = Some(analyzers);
        self
    }

    /// Whether the analyzer named `name` was selected
    pub fn is_enabled(&self, name: &str) -> bool {
        self.analyzers
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_analyzers_enabled_by_default() {
        let request = CatalogRequest::new("dir:.", Scope::Squashed, OutputFormat::Json);
        assert!(request.is_enabled("python"));
        assert!(request.is_enabled("dpkg"));
    }

    #[test]
    fn test_analyzer_selection() {
        let request = CatalogRequest::new("dir:.", Scope::Squashed, OutputFormat::Json)
            .with_analyzers(vec!["Python".to_string()]);
        assert!(request.is_enabled("python"));
        assert!(!request.is_enabled("dpkg"));
    }
}
