//! Manifest signing.
//!
//! Production signatures are PKCS#7 SignedData over the exact
//! `manifest.json` bytes, detached (no encapsulated content), in binary mode
//! so line endings are not canonicalized, and embedding the pass type
//! certificate plus the wallet intermediate so readers can build the chain.
//!
//! When no usable credentials exist the signer emits a placeholder instead
//! of failing. Real wallets reject such bundles, so callers must check
//! [`Signature::is_placeholder`] before treating a pass as production ready.

use super::identity::{SigningCredentials, SigningIdentity};
use crate::bundle::sha1_hex;
use crate::{Error, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::X509;

/// First line of every placeholder signature.
pub const PLACEHOLDER_MARKER: &[u8] = b"PKPASS-PLACEHOLDER-SIGNATURE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureKind {
    Signed,
    /// Degraded mode. `reason` says why real signing did not happen.
    Placeholder { reason: String },
}

/// Contents of the bundle's `signature` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub bytes: Vec<u8>,
    pub kind: SignatureKind,
}

impl Signature {
    /// Deterministic stand-in: marker line, then the manifest's SHA-1.
    pub fn placeholder(manifest: &[u8], reason: impl Into<String>) -> Self {
        let mut bytes = PLACEHOLDER_MARKER.to_vec();
        bytes.push(b'\n');
        bytes.extend_from_slice(sha1_hex(manifest).as_bytes());
        bytes.push(b'\n');
        Self {
            bytes,
            kind: SignatureKind::Placeholder {
                reason: reason.into(),
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, SignatureKind::Placeholder { .. })
    }
}

/// Whether raw `signature` file bytes are a placeholder.
pub fn is_placeholder_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PLACEHOLDER_MARKER)
}

/// PKCS#7 detached signature over `data`.
pub fn sign_detached(data: &[u8], credentials: &SigningCredentials) -> Result<Vec<u8>> {
    let mut certs = Stack::<X509>::new()
        .map_err(|e| Error::Signing(format!("Failed to allocate certificate stack: {}", e)))?;
    certs
        .push(credentials.intermediate.clone())
        .map_err(|e| Error::Signing(format!("Failed to add intermediate certificate: {}", e)))?;

    let pkcs7 = Pkcs7::sign(
        &credentials.certificate,
        &credentials.private_key,
        &certs,
        data,
        Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY,
    )
    .map_err(|e| Error::Signing(format!("Failed to build PKCS#7 signature: {}", e)))?;

    pkcs7
        .to_der()
        .map_err(|e| Error::Signing(format!("Failed to encode PKCS#7 signature: {}", e)))
}

/// Signs manifests with a fixed [`SigningIdentity`].
#[derive(Debug)]
pub struct Signer {
    identity: SigningIdentity,
}

impl Signer {
    pub fn new(identity: SigningIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Signs with freshly loaded credentials, propagating every failure.
    pub fn try_sign(&self, manifest: &[u8]) -> Result<Vec<u8>> {
        let credentials = self.identity.load_credentials()?;
        sign_detached(manifest, &credentials)
    }

    /// Signs `manifest`, degrading to [`Signature::placeholder`] on any failure.
    pub fn sign(&self, manifest: &[u8]) -> Signature {
        if !self.identity.is_production() {
            tracing::warn!("no signing identity configured; using placeholder signature");
            return Signature::placeholder(manifest, "development identity");
        }
        match self.try_sign(manifest) {
            Ok(bytes) => Signature {
                bytes,
                kind: SignatureKind::Signed,
            },
            Err(e) => {
                tracing::warn!(error = %e, "manifest signing failed; using placeholder signature");
                Signature::placeholder(manifest, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_support::{test_identity, test_pkcs12, test_pkcs12_with_mac};
    use openssl::hash::MessageDigest;
    use openssl::x509::store::X509StoreBuilder;

    fn production_signer(password: &str) -> (Signer, X509, X509) {
        let (key, cert) = test_identity("Pass Type ID: pass.ABCDE12345.coffee", "ABCDE12345");
        let (_, wwdr) = test_identity("Test WWDR", "G4");
        let p12 = test_pkcs12(&key, &cert, "secret");
        let identity = SigningIdentity::production(p12, password, wwdr.to_pem().unwrap());
        (Signer::new(identity), cert, wwdr)
    }

    #[test]
    fn test_signature_verifies_against_manifest() {
        let (signer, cert, wwdr) = production_signer("secret");
        let manifest: &[u8] = br#"{"pass.json":"abc"}"#;

        let signature = signer.sign(manifest);
        assert_eq!(signature.kind, SignatureKind::Signed);
        assert!(!is_placeholder_signature(&signature.bytes));

        let pkcs7 = Pkcs7::from_der(&signature.bytes).unwrap();
        let mut certs = Stack::new().unwrap();
        certs.push(cert).unwrap();
        certs.push(wwdr).unwrap();
        let store = X509StoreBuilder::new().unwrap().build();

        pkcs7
            .verify(&certs, &store, Some(manifest), None, Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY)
            .unwrap();
        assert!(pkcs7
            .verify(&certs, &store, Some(&b"tampered"[..]), None, Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY)
            .is_err());
    }

    #[test]
    fn test_signature_embeds_intermediate() {
        let (signer, _, wwdr) = production_signer("secret");
        let signature = signer.sign(b"{}");
        let wwdr_der = wwdr.to_der().unwrap();
        assert!(signature
            .bytes
            .windows(wwdr_der.len())
            .any(|w| w == wwdr_der.as_slice()));
    }

    #[test]
    fn test_wrong_passphrase_degrades_to_placeholder() {
        let (signer, _, _) = production_signer("wrong");
        let signature = signer.sign(b"{}");
        assert!(signature.is_placeholder());
        assert!(is_placeholder_signature(&signature.bytes));
        assert!(signer.try_sign(b"{}").is_err());
    }

    #[test]
    fn test_sha256_mac_container_signs_and_degrades() {
        let (key, cert) = test_identity("Pass Type ID: pass.ABCDE12345.coffee", "ABCDE12345");
        let (_, wwdr) = test_identity("Test WWDR", "G4");
        let p12 = test_pkcs12_with_mac(&key, &cert, "secret", MessageDigest::sha256());

        let good = Signer::new(SigningIdentity::production(p12.clone(), "secret", wwdr.to_pem().unwrap()));
        assert_eq!(good.sign(b"{}").kind, SignatureKind::Signed);

        let bad = Signer::new(SigningIdentity::production(p12, "wrong", wwdr.to_pem().unwrap()));
        assert!(bad.sign(b"{}").is_placeholder());
    }

    #[test]
    fn test_development_identity_uses_placeholder() {
        let signer = Signer::new(SigningIdentity::DevelopmentPlaceholder);
        let signature = signer.sign(b"{}");
        assert_eq!(
            signature.kind,
            SignatureKind::Placeholder {
                reason: "development identity".into()
            }
        );
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = Signature::placeholder(b"manifest", "x");
        let b = Signature::placeholder(b"manifest", "y");
        assert_eq!(a.bytes, b.bytes);
        assert_ne!(a.bytes, Signature::placeholder(b"other", "x").bytes);
        assert!(String::from_utf8(a.bytes).unwrap().contains(&sha1_hex(b"manifest")));
    }
}
