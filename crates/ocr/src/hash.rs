use sha2::{Digest, Sha256};

use crate::types::SourceId;

/// SHA-256 of an in-memory image.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Content identity of a source image: the same bytes always yield the same id,
/// whatever the file was called.
pub fn source_id(image_bytes: &[u8]) -> SourceId {
    SourceId(to_hex(&sha256_bytes(image_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_bytes_known_vector() {
        assert_eq!(
            to_hex(&sha256_bytes(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn source_id_depends_only_on_content() {
        assert_eq!(source_id(b"scan-1"), source_id(b"scan-1"));
        assert_ne!(source_id(b"scan-1"), source_id(b"scan-2"));
        assert_eq!(source_id(b"scan-1").0.len(), 64);
    }
}
