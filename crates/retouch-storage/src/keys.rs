//! Shared key generation for resource stores.
//!
//! Key format: `resources/{hash[0..2]}/{hash}`.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Generate the storage key for a content hash.
pub fn generate_resource_key(hash: &str) -> String {
    let prefix = hash.get(..2).unwrap_or(hash);
    format!("resources/{}/{}", prefix, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sharded_by_hash_prefix() {
        let hash = content_hash(b"pixels");
        let key = generate_resource_key(&hash);
        assert!(key.starts_with(&format!("resources/{}/", &hash[..2])));
        assert!(key.ends_with(&hash));
    }

    #[test]
    fn test_identical_bytes_share_a_hash() {
        assert_eq!(content_hash(b"same"), content_hash(b"same"));
        assert_ne!(content_hash(b"same"), content_hash(b"other"));
    }
}
