use crate::cataloging::domain::Distro;
use crate::ports::outbound::{DistroDetector, FileResolver};

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// OsReleaseDetector adapter reading the freedesktop `os-release` file
#[derive(Debug, Default, Clone, Copy)]
pub struct OsReleaseDetector;

impl OsReleaseDetector {
    pub fn new() -> Self {
        Self
    }
}

impl DistroDetector for OsReleaseDetector {
    fn detect(&self, resolver: &dyn FileResolver) -> Option<Distro> {
        for path in OS_RELEASE_PATHS {
            let location = match resolver.files_by_path(&[path]) {
                Ok(mut locations) if !locations.is_empty() => locations.remove(0),
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(path, error = %e, "os-release not resolvable");
                    continue;
                }
            };
            match resolver.file_contents_string(&location) {
                Ok(text) => {
                    if let Some(distro) = parse_os_release(&text) {
                        tracing::debug!(name = %distro.name, version = %distro.version, "detected distro");
                        return Some(distro);
                    }
                }
                Err(e) => tracing::warn!(path, error = %e, "unreadable os-release"),
            }
        }
        None
    }
}

/// Parses `KEY=value` lines; values may be single or double quoted
fn parse_os_release(text: &str) -> Option<Distro> {
    let mut distro = Distro::default();
    for line in text.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim() {
            "ID" => distro.name = value,
            "VERSION_ID" => distro.version = value,
            "ID_LIKE" => distro.id_like = value.split_whitespace().map(str::to_string).collect(),
            "PRETTY_NAME" => distro.pretty_name = Some(value),
            _ => {}
        }
    }
    if distro.name.is_empty() {
        None
    } else {
        Some(distro)
    }
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::filesystem::DirectoryResolver;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_os_release() {
        let distro = parse_os_release(
            "PRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\nNAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n# comment\n",
        )
        .unwrap();
        assert_eq!(distro.name, "ubuntu");
        assert_eq!(distro.version, "22.04");
        assert_eq!(distro.id_like, vec!["debian"]);
        assert_eq!(distro.pretty_name.as_deref(), Some("Ubuntu 22.04.4 LTS"));
    }

    #[test]
    fn test_parse_os_release_without_id() {
        assert!(parse_os_release("NAME='Mystery'\n").is_none());
    }

    #[test]
    fn test_detect_falls_back_to_usr_lib() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("usr/lib")).unwrap();
        fs::write(
            root.path().join("usr/lib/os-release"),
            "ID=alpine\nVERSION_ID=3.19.1\n",
        )
        .unwrap();

        let resolver = DirectoryResolver::new(root.path()).unwrap();
        let distro = OsReleaseDetector::new().detect(&resolver).unwrap();
        assert_eq!(distro.name, "alpine");
        assert_eq!(distro.version, "3.19.1");
    }

    #[test]
    fn test_detect_nothing() {
        let root = TempDir::new().unwrap();
        let resolver = DirectoryResolver::new(root.path()).unwrap();
        assert!(OsReleaseDetector::new().detect(&resolver).is_none());
    }
}
