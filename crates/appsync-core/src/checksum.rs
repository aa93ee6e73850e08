use sha2::{Digest, Sha256};

/// Stable content checksum (hex SHA-256) used to detect schema and policy changes.
pub fn checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        let schema = "type Query { hello: String }";
        assert_eq!(checksum(schema), checksum(schema));
        assert_eq!(checksum(schema).len(), 64);
        assert_ne!(checksum(schema), checksum("type Query { hi: String }"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
