use chrono::Utc;
use uuid::Uuid;

/// Per-document values that change on every encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    timestamp: String,
    serial_number: Uuid,
}

impl DocumentInfo {
    pub fn new(timestamp: impl Into<String>, serial_number: Uuid) -> Self {
        Self {
            timestamp: timestamp.into(),
            serial_number,
        }
    }

    /// Generates a creation timestamp (RFC 3339) and a random serial
    pub fn generate() -> Self {
        Self::new(Utc::now().to_rfc3339(), Uuid::new_v4())
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn serial_number(&self) -> &Uuid {
        &self.serial_number
    }

    /// Serial in `urn:uuid:` form
    pub fn serial_urn(&self) -> String {
        format!("urn:uuid:{}", self.serial_number)
    }
}
