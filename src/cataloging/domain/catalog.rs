use super::{Package, PackageId};
use crate::shared::error::CatalogerError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// A descriptive field on which two observations of the same package disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConflict {
    pub id: PackageId,
    pub name: String,
    pub field: &'static str,
    pub existing: String,
    pub incoming: String,
}

impl From<IdentityConflict> for CatalogerError {
    fn from(conflict: IdentityConflict) -> Self {
        CatalogerError::DuplicateIdentityConflict {
            id: format!("{} ({})", conflict.id, conflict.name),
            field: conflict.field.to_string(),
            existing: conflict.existing,
            incoming: conflict.incoming,
        }
    }
}

/// Result of adding an observation to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted(PackageId),
    Merged {
        id: PackageId,
        new_locations: usize,
        conflicts: usize,
    },
}

/// Catalog aggregate: the deduplicated set of packages keyed by id
///
/// `add` takes `&self` and may be called from several threads at once; the
/// sharded map serializes access per id so the lookup-then-insert-or-merge
/// decision is atomic.
#[derive(Debug, Default)]
pub struct Catalog {
    packages: DashMap<PackageId, Package>,
    conflicts: Mutex<Vec<IdentityConflict>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_packages<I: IntoIterator<Item = Package>>(packages: I) -> Self {
        let catalog = Self::new();
        for package in packages {
            catalog.add(package);
        }
        catalog
    }

    /// Adds a raw observation, merging it into an existing entry with the same id
    ///
    /// On merge only the location set grows. Every other field keeps the
    /// value of the first observation; disagreements are recorded as
    /// conflicts and logged, never treated as errors.
    pub fn add(&self, package: Package) -> AddOutcome {
        match self.packages.entry(package.id().clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let conflicts = detect_conflicts(existing, &package);
                let new_locations = existing.merge_locations(package.locations());
                let id = existing.id().clone();
                drop(entry);

                debug!(
                    package = %package.name(),
                    id = %id,
                    new_locations,
                    "merged duplicate package observation"
                );
                let conflict_count = conflicts.len();
                if conflict_count > 0 {
                    for conflict in &conflicts {
                        warn!(
                            package = %conflict.name,
                            id = %conflict.id,
                            field = conflict.field,
                            existing = %conflict.existing,
                            incoming = %conflict.incoming,
                            "duplicate package identity with conflicting field; keeping first observation"
                        );
                    }
                    self.conflicts
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .extend(conflicts);
                }

                AddOutcome::Merged {
                    id,
                    new_locations,
                    conflicts: conflict_count,
                }
            }
            Entry::Vacant(entry) => {
                let id = package.id().clone();
                entry.insert(package);
                AddOutcome::Inserted(id)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.packages.contains_key(id)
    }

    pub fn package(&self, id: &PackageId) -> Option<Package> {
        self.packages.get(id).map(|entry| entry.value().clone())
    }

    /// All packages in deterministic order: type, name, version, then id
    pub fn sorted(&self) -> Vec<Package> {
        let mut packages: Vec<Package> = self
            .packages
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        packages.sort_by(|a, b| {
            a.package_type()
                .as_str()
                .cmp(b.package_type().as_str())
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.version().cmp(b.version()))
                .then_with(|| a.id().cmp(b.id()))
        });
        packages
    }

    /// Packages evidenced by a file at the given real path, in sorted order
    pub fn packages_by_path(&self, real_path: &str) -> Vec<Package> {
        self.sorted()
            .into_iter()
            .filter(|p| p.locations().iter().any(|l| l.real_path() == real_path))
            .collect()
    }

    /// Conflicts observed so far, in the order they were recorded
    pub fn conflicts(&self) -> Vec<IdentityConflict> {
        self.conflicts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn detect_conflicts(existing: &Package, incoming: &Package) -> Vec<IdentityConflict> {
    let mut conflicts = Vec::new();
    let mut record = |field: &'static str, existing_value: String, incoming_value: String| {
        conflicts.push(IdentityConflict {
            id: existing.id().clone(),
            name: existing.name().to_string(),
            field,
            existing: existing_value,
            incoming: incoming_value,
        });
    };

    if !existing.licenses().is_not_found()
        && !incoming.licenses().is_not_found()
        && existing.licenses() != incoming.licenses()
    {
        record(
            "licenses",
            existing.licenses().summary(),
            incoming.licenses().summary(),
        );
    }

    if let (Some(a), Some(b)) = (existing.language(), incoming.language()) {
        if a != b {
            record("language", a.to_string(), b.to_string());
        }
    }

    if let (Some(a), Some(b)) = (existing.purl(), incoming.purl()) {
        if a != b {
            record("purl", a.to_string(), b.to_string());
        }
    }

    if !existing.cpes().is_empty() && !incoming.cpes().is_empty() && existing.cpes() != incoming.cpes()
    {
        record("cpes", existing.cpes().join(" "), incoming.cpes().join(" "));
    }

    conflicts
}
