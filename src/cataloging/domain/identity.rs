use sha2::{Digest, Sha256};

/// Number of hex characters kept from a SHA-256 digest for identifiers
pub const ID_HEX_LEN: usize = 16;

/// Computes a truncated, lowercase hex SHA-256 over `bytes`
///
/// Identifiers built from this are content-addressed: the same input always
/// yields the same id, regardless of process, platform or insertion order.
pub fn content_id(bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    digest[..ID_HEX_LEN].to_string()
}

/// Full lowercase hex SHA-256 prefixed with the algorithm, as used for layer digests
pub fn sha256_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}
