use std::collections::BTreeSet;

/// Licenses value object describing what an analyzer learned about licensing
///
/// `NotFound` and `ConfirmedAbsent` are distinct: the first means no license
/// information was located, the second that the package is known to carry
/// no license. Documents render them with different sentinel values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Licenses {
    #[default]
    NotFound,
    ConfirmedAbsent,
    Declared(BTreeSet<String>),
}

impl Licenses {
    /// Builds a license value from raw strings; blank input yields `NotFound`
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if set.is_empty() {
            Licenses::NotFound
        } else {
            Licenses::Declared(set)
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Licenses::Declared(set) => set.iter().map(String::as_str).collect(),
            Licenses::NotFound | Licenses::ConfirmedAbsent => Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Licenses::NotFound)
    }

    /// Human readable summary, used in conflict reports
    pub fn summary(&self) -> String {
        match self {
            Licenses::NotFound => "<not found>".to_string(),
            Licenses::ConfirmedAbsent => "<none>".to_string(),
            Licenses::Declared(set) => set.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}
