use sbom_cataloger::prelude::*;

/// Mock DistroDetector returning a fixed answer
#[derive(Default)]
pub struct MockDistroDetector {
    distro: Option<Distro>,
}

impl MockDistroDetector {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn debian() -> Self {
        Self {
            distro: Some(Distro {
                name: "debian".to_string(),
                version: "12".to_string(),
                id_like: Vec::new(),
                pretty_name: Some("Debian GNU/Linux 12 (bookworm)".to_string()),
            }),
        }
    }
}

impl DistroDetector for MockDistroDetector {
    fn detect(&self, _resolver: &dyn FileResolver) -> Option<Distro> {
        self.distro.clone()
    }
}
