//! Hand-off of packaged passes to clients.
//!
//! Clients either pass the base64 payload to the platform "add pass" API or,
//! where that API is missing, offer the raw bytes as a download typed
//! [`PKPASS_MIME_TYPE`].

use crate::Result;
use base64::Engine;
use std::fs;
use std::path::Path;

/// MIME type wallet-aware browsers recognize.
pub const PKPASS_MIME_TYPE: &str = "application/vnd.apple.pkpass";

/// Reads the archive at `path` and base64-encodes it.
pub fn encode_pass(path: impl AsRef<Path>) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(encode_pass_bytes(&bytes))
}

pub fn encode_pass_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// `Content-Disposition` filename for a stored pass.
pub fn download_file_name(pass_id: &str) -> String {
    format!("{pass_id}.pkpass")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_pass_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.pkpass");
        fs::write(&path, b"PK\x03\x04zip").unwrap();

        let encoded = encode_pass(&path).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"PK\x03\x04zip");
    }

    #[test]
    fn test_encode_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(encode_pass(temp.path().join("absent.pkpass")).is_err());
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name("42-1"), "42-1.pkpass");
    }
}
