//! Digest helpers for formula checksum verification.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Checksum algorithms a formula may declare.
///
/// New formulas carry sha256 digests; older ones still ship sha1 or md5,
/// so verification has to speak all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Sha256,
    Sha1,
    Md5,
}

impl DigestKind {
    /// Length of a hex-encoded digest of this kind.
    pub fn hex_len(self) -> usize {
        match self {
            DigestKind::Sha256 => 64,
            DigestKind::Sha1 => 40,
            DigestKind::Md5 => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestKind::Sha256 => "sha256",
            DigestKind::Sha1 => "sha1",
            DigestKind::Md5 => "md5",
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute a digest of a byte slice, hex-encoded.
pub fn digest_bytes(kind: DigestKind, data: &[u8]) -> String {
    match kind {
        DigestKind::Sha256 => hex::encode(Sha256::digest(data)),
        DigestKind::Sha1 => hex::encode(Sha1::digest(data)),
        DigestKind::Md5 => hex::encode(Md5::digest(data)),
    }
}

/// Compute the SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

/// Compute a digest of a file without loading it whole into memory.
pub fn digest_file(kind: DigestKind, path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;
    let reader = BufReader::new(file);

    let digest = match kind {
        DigestKind::Sha256 => digest_reader::<Sha256>(reader),
        DigestKind::Sha1 => digest_reader::<Sha1>(reader),
        DigestKind::Md5 => digest_reader::<Md5>(reader),
    };
    digest.with_context(|| format!("failed to hash file: {}", path.display()))
}

fn digest_reader<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_bytes_all_kinds() {
        assert_eq!(
            digest_bytes(DigestKind::Sha256, b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            digest_bytes(DigestKind::Sha1, b"hello"),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            digest_bytes(DigestKind::Md5, b"hello"),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn test_digest_file_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.txt");
        std::fs::write(&path, "hello").unwrap();

        for kind in [DigestKind::Sha256, DigestKind::Sha1, DigestKind::Md5] {
            assert_eq!(digest_file(kind, &path).unwrap(), digest_bytes(kind, b"hello"));
        }
    }

    #[test]
    fn test_hex_len() {
        assert_eq!(DigestKind::Sha256.hex_len(), 64);
        assert_eq!(DigestKind::Sha1.hex_len(), 40);
        assert_eq!(DigestKind::Md5.hex_len(), 32);
    }

    #[test]
    fn test_sha256_str() {
        assert_eq!(
            sha256_str("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
