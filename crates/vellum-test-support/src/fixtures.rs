//! Filesystem and byte-payload fixtures shared by integration suites.

use rand::RngCore;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Create a fresh temporary directory, panicking on failure since this is
/// only ever called from test code.
#[must_use]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir for test fixture")
}

/// Generate `len` random bytes using a fast, non-cryptographic RNG; good
/// enough for exercising checksum and byte-range logic in tests.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0_u8; len];
    rand::rng().fill_bytes(&mut buf);
    buf
}

/// Lowercase hex-encoded SHA-256 digest of `data`, matching the format
/// the download manager compares `expectedChecksum` against.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn random_bytes_respects_length() {
        assert_eq!(random_bytes(128).len(), 128);
    }
}
