/// A block of `Key: value` fields, as found in dpkg status and Python core metadata
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Paragraph {
    fields: Vec<(String, String)>,
}

impl Paragraph {
    /// First value of a field, compared case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Every value of a repeatable field such as `Classifier`
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Splits RFC 822 style text into paragraphs separated by blank lines
///
/// Lines starting with whitespace continue the previous field's value.
pub(crate) fn parse_paragraphs(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut current = Paragraph::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.fields.last_mut() {
                let continuation = line.trim();
                if continuation != "." {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(continuation);
                }
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            current
                .fields
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

/// Parses only the header block, stopping at the first blank line
///
/// Python core metadata puts the long description after the headers.
pub(crate) fn parse_headers(text: &str) -> Paragraph {
    let normalized = text.replace("\r\n", "\n");
    let header_block = normalized.split("\n\n").next().unwrap_or_default();
    parse_paragraphs(header_block)
        .into_iter()
        .next()
        .unwrap_or_default()
}
