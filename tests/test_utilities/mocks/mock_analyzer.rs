use sbom_cataloger::prelude::*;

/// Mock PackageAnalyzer returning a fixed set of observations
pub struct MockAnalyzer {
    name: String,
    packages: Vec<Package>,
}

impl MockAnalyzer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            packages: Vec::new(),
        }
    }

    /// Adds a python package observed at `path`
    pub fn with_package(mut self, name: &str, version: &str, path: &str) -> Self {
        self.packages.push(
            Package::new(name, version, PackageType::Python)
                .unwrap()
                .with_found_by(&self.name)
                .with_location(Location::new(path)),
        );
        self
    }

    pub fn with_observation(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }
}

impl PackageAnalyzer for MockAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, _resolver: &dyn FileResolver) -> Result<Vec<Package>> {
        Ok(self.packages.clone())
    }
}

/// Mock PackageAnalyzer that always fails
pub struct FailingAnalyzer {
    name: String,
}

impl FailingAnalyzer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl PackageAnalyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, _resolver: &dyn FileResolver) -> Result<Vec<Package>> {
        Err(anyhow::anyhow!("simulated analyzer failure"))
    }
}
