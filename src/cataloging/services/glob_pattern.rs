use crate::shared::Result;

/// Maximum length of a single glob pattern to prevent DoS attacks
const MAX_PATTERN_LENGTH: usize = 1024;

/// GlobPattern - Matches absolute file paths against a glob expression
///
/// Supported syntax:
/// - `*` matches zero or more characters within one path segment
/// - `?` matches exactly one character within one path segment
/// - `**` as a whole segment matches zero or more segments
///
/// Patterns are anchored at the source root; a relative pattern such as
/// `**/METADATA` is treated as `/**/METADATA`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    AnyDepth,
    Component(PatternMatcher),
}

/// Pattern matcher types for one path segment
#[derive(Debug, Clone)]
enum PatternMatcher {
    /// Exact match: "METADATA"
    Exact(String),
    /// Any segment: "*"
    Any,
    /// Prefix wildcard: "*.dist-info"
    Prefix(String),
    /// Suffix wildcard: "python3*"
    Suffix(String),
    /// Anything else, matched character by character
    Wildcard(Vec<char>),
}

impl PatternMatcher {
    fn compile(segment: &str) -> Self {
        let stars = segment.matches('*').count();
        let has_question = segment.contains('?');

        if stars == 0 && !has_question {
            return PatternMatcher::Exact(segment.to_string());
        }
        if segment == "*" {
            return PatternMatcher::Any;
        }
        if stars == 1 && !has_question {
            if let Some(suffix) = segment.strip_prefix('*') {
                return PatternMatcher::Prefix(suffix.to_string());
            }
            if let Some(prefix) = segment.strip_suffix('*') {
                return PatternMatcher::Suffix(prefix.to_string());
            }
        }
        PatternMatcher::Wildcard(segment.chars().collect())
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            PatternMatcher::Exact(s) => segment == s,
            PatternMatcher::Any => true,
            PatternMatcher::Prefix(suffix) => segment.ends_with(suffix.as_str()),
            PatternMatcher::Suffix(prefix) => segment.starts_with(prefix.as_str()),
            PatternMatcher::Wildcard(pattern) => {
                let text: Vec<char> = segment.chars().collect();
                wildcard_match(pattern, &text)
            }
        }
    }
}

/// Iterative wildcard matcher with single-star backtracking
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

impl GlobPattern {
    /// Compiles a glob pattern
    ///
    /// # Errors
    /// Returns an error when the pattern is empty, too long or contains
    /// control characters
    pub fn new(pattern: &str) -> Result<Self> {
        validate_pattern(pattern)?;

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| match s {
                "**" => Segment::AnyDepth,
                other => Segment::Component(PatternMatcher::compile(other)),
            })
            .collect();

        Ok(Self {
            original: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Checks whether an absolute, cleaned path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Component(matcher), rest)) => match parts.split_first() {
            Some((part, remaining)) => matcher.matches(part) && match_segments(rest, remaining),
            None => false,
        },
    }
}

fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        anyhow::bail!("Glob pattern cannot be empty");
    }

    // Security: Length limit to prevent DoS
    if pattern.len() > MAX_PATTERN_LENGTH {
        anyhow::bail!(
            "Glob pattern is too long ({} bytes). Maximum allowed: {} bytes",
            pattern.len(),
            MAX_PATTERN_LENGTH
        );
    }

    if pattern.chars().any(char::is_control) {
        anyhow::bail!("Glob pattern contains control characters: '{}'", pattern.escape_debug());
    }

    Ok(())
}
