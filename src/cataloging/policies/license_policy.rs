use crate::cataloging::domain::Licenses;

/// SPDX sentinel for "no license information was found"
pub const NO_ASSERTION: &str = "NOASSERTION";

/// SPDX sentinel for "the package is known to carry no license"
pub const NONE: &str = "NONE";

const LICENSE_REF_PREFIX: &str = "LicenseRef-";

/// Common free-text license names mapped to SPDX identifiers
const KNOWN_LICENSE_NAMES: &[(&str, &str)] = &[
    ("mit license", "MIT"),
    ("mit", "MIT"),
    ("apache 2.0", "Apache-2.0"),
    ("apache-2", "Apache-2.0"),
    ("apache license 2.0", "Apache-2.0"),
    ("apache license, version 2.0", "Apache-2.0"),
    ("apache software license", "Apache-2.0"),
    ("bsd 3-clause", "BSD-3-Clause"),
    ("new bsd license", "BSD-3-Clause"),
    ("bsd 2-clause", "BSD-2-Clause"),
    ("isc license", "ISC"),
    ("isc license (iscl)", "ISC"),
    ("mozilla public license 2.0 (mpl 2.0)", "MPL-2.0"),
    ("python software foundation license", "PSF-2.0"),
    ("gnu general public license v2 (gplv2)", "GPL-2.0-only"),
    ("gnu general public license v3 (gplv3)", "GPL-3.0-only"),
    ("gnu lesser general public license v3 (lgplv3)", "LGPL-3.0-only"),
    ("the unlicense (unlicense)", "Unlicense"),
];

/// LicensePolicy encoding how license information is selected and rendered
///
/// Selection priority for Python core metadata:
/// 1. License-Expression field (if non-empty)
/// 2. License field (if non-empty and not "UNKNOWN")
/// 3. OSI Approved license from classifiers
pub struct LicensePolicy;

impl LicensePolicy {
    /// Selects the most appropriate license text based on priority rules
    pub fn select_license(
        license: Option<String>,
        license_expression: Option<String>,
        classifiers: &[String],
    ) -> Option<String> {
        license_expression
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .or_else(|| {
                license
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty() && l != "UNKNOWN")
            })
            .or_else(|| Self::extract_license_from_classifiers(classifiers))
    }

    /// Looks for classifiers with the prefix "License :: OSI Approved :: "
    fn extract_license_from_classifiers(classifiers: &[String]) -> Option<String> {
        classifiers
            .iter()
            .find_map(|c| c.strip_prefix("License :: OSI Approved :: "))
            .map(str::to_string)
    }

    /// Renders licenses as one SPDX license expression
    ///
    /// `NotFound` becomes `NOASSERTION`, `ConfirmedAbsent` becomes `NONE`,
    /// declared values are converted to SPDX identifiers and joined with `AND`.
    pub fn to_spdx_expression(licenses: &Licenses) -> String {
        match licenses {
            Licenses::NotFound => NO_ASSERTION.to_string(),
            Licenses::ConfirmedAbsent => NONE.to_string(),
            Licenses::Declared(values) => {
                let terms: Vec<String> = values
                    .iter()
                    .map(|value| {
                        let term = Self::spdx_term(value);
                        if values.len() > 1 && term.contains(' ') {
                            format!("({})", term)
                        } else {
                            term
                        }
                    })
                    .collect();
                terms.join(" AND ")
            }
        }
    }

    /// Parses an SPDX license expression back into licenses
    pub fn from_spdx_expression(expression: &str) -> Licenses {
        let expression = expression.trim();
        match expression {
            "" | NO_ASSERTION => Licenses::NotFound,
            NONE => Licenses::ConfirmedAbsent,
            _ => Licenses::from_values(
                split_top_level_and(expression)
                    .into_iter()
                    .map(strip_outer_parens),
            ),
        }
    }

    /// Converts one declared license value into an SPDX term
    ///
    /// Known free-text names map to their identifier, values that already
    /// look like SPDX identifiers or expressions are kept, anything else
    /// becomes a `LicenseRef-` with unsupported characters replaced.
    pub fn spdx_term(value: &str) -> String {
        let value = value.trim();
        if let Some((_, id)) = KNOWN_LICENSE_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value))
        {
            return id.to_string();
        }
        if is_spdx_expression(value) {
            return value.to_string();
        }
        format!("{}{}", LICENSE_REF_PREFIX, sanitize_license_ref(value))
    }
}

fn is_spdx_identifier(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+'))
}

fn is_spdx_expression(value: &str) -> bool {
    let cleaned = value.replace(['(', ')'], " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() % 2 == 0 {
        return false;
    }
    // identifiers and operators alternate: "A OR B WITH C"
    tokens.iter().enumerate().all(|(i, token)| {
        let is_operator = matches!(*token, "AND" | "OR" | "WITH");
        if i % 2 == 0 {
            !is_operator && is_spdx_identifier(token)
        } else {
            is_operator
        }
    })
}

fn sanitize_license_ref(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Splits on `AND` operators that are not nested inside parentheses
fn split_top_level_and(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let bytes = expression.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b' ' if depth == 0 && expression[i..].starts_with(" AND ") => {
                parts.push(expression[start..i].trim());
                i += " AND ".len();
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(expression[start..].trim());
    parts
}

fn strip_outer_parens(term: &str) -> &str {
    let term = term.trim();
    match term.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) if !inner.contains(['(', ')']) => inner.trim(),
        _ => term,
    }
}
