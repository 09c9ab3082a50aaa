//! Signing identity selection and credential loading.
//!
//! A [`SigningIdentity`] is chosen once, at startup, by the configuration
//! loader. [`SigningCredentials`] are parsed from it on every signing
//! operation and dropped afterwards.

use super::pkcs12::extract_identity;
use crate::{Error, Result};
use openssl::asn1::Asn1StringRef;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509NameRef, X509};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Which key material signs pass manifests.
pub enum SigningIdentity {
    /// Real credentials injected by the deployment.
    Production {
        /// PKCS#12 container with the pass type certificate and its key.
        pkcs12: Vec<u8>,
        passphrase: SecretString,
        /// Wallet platform intermediate certificate (PEM or DER).
        intermediate: Vec<u8>,
    },
    /// No credentials. Every manifest gets a placeholder signature.
    DevelopmentPlaceholder,
}

impl SigningIdentity {
    pub fn production(
        pkcs12: Vec<u8>,
        passphrase: impl Into<String>,
        intermediate: Vec<u8>,
    ) -> Self {
        Self::Production {
            pkcs12,
            passphrase: SecretString::new(passphrase.into()),
            intermediate,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production { .. })
    }

    /// Parses fresh credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for the development identity and
    /// [`Error::Certificate`] when the material does not parse.
    pub fn load_credentials(&self) -> Result<SigningCredentials> {
        match self {
            Self::Production {
                pkcs12,
                passphrase,
                intermediate,
            } => SigningCredentials::load(pkcs12, passphrase, intermediate),
            Self::DevelopmentPlaceholder => Err(Error::Config(
                "development identity has no signing credentials".into(),
            )),
        }
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production {
                pkcs12,
                intermediate,
                ..
            } => f
                .debug_struct("Production")
                .field("pkcs12_len", &pkcs12.len())
                .field("passphrase", &"[REDACTED]")
                .field("intermediate_len", &intermediate.len())
                .finish(),
            Self::DevelopmentPlaceholder => f.write_str("DevelopmentPlaceholder"),
        }
    }
}

/// Parsed key material ready to sign.
///
/// # Security
///
/// Holds a private key. Do not log or persist.
pub struct SigningCredentials {
    /// Pass type certificate (leaf).
    pub certificate: X509,
    pub private_key: PKey<Private>,
    pub intermediate: X509,
    /// Team ID from the leaf certificate's OU.
    pub team_id: Option<String>,
    /// PKCS#12 extraction strategy that found the key.
    pub key_source: &'static str,
}

impl SigningCredentials {
    /// Load from a PKCS#12 container and an intermediate certificate.
    ///
    /// The leaf is the certificate whose public key matches the extracted
    /// private key, wherever it sits in the container.
    pub fn load(pkcs12: &[u8], passphrase: &SecretString, intermediate: &[u8]) -> Result<Self> {
        let extracted = extract_identity(pkcs12, passphrase.expose_secret())?;

        let certificate = extracted
            .certificates
            .into_iter()
            .find(|cert| {
                cert.public_key()
                    .map(|public| extracted.private_key.public_eq(&public))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                Error::Certificate("No certificate in PKCS#12 matches its private key".into())
            })?;

        Self::from_parts(certificate, extracted.private_key, intermediate, extracted.strategy)
    }

    /// Load from a PEM certificate, unencrypted PEM key and intermediate.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], intermediate: &[u8]) -> Result<Self> {
        let certificate = X509::from_pem(cert_pem)
            .or_else(|_| X509::from_der(cert_pem))
            .map_err(|e| Error::Certificate(format!("Failed to load certificate: {}", e)))?;
        let private_key = PKey::private_key_from_pem(key_pem)
            .or_else(|_| PKey::private_key_from_der(key_pem))
            .map_err(|e| Error::Certificate(format!("Failed to load private key: {}", e)))?;
        Self::from_parts(certificate, private_key, intermediate, "pem")
    }

    fn from_parts(
        certificate: X509,
        private_key: PKey<Private>,
        intermediate: &[u8],
        key_source: &'static str,
    ) -> Result<Self> {
        Self::validate_key_pair(&certificate, &private_key)?;

        let intermediate = X509::from_pem(intermediate)
            .or_else(|_| X509::from_der(intermediate))
            .map_err(|e| {
                Error::Certificate(format!("Failed to load intermediate certificate: {}", e))
            })?;

        let team_id = extract_team_id(&certificate);

        Ok(Self {
            certificate,
            private_key,
            intermediate,
            team_id,
            key_source,
        })
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(cert: &X509, private_key: &PKey<Private>) -> Result<()> {
        let cert_public_key = cert.public_key().map_err(|e| {
            Error::Certificate(format!(
                "Failed to extract public key from certificate: {}",
                e
            ))
        })?;

        if !private_key.public_eq(&cert_public_key) {
            return Err(Error::Certificate(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(())
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            subject: format_name(self.certificate.subject_name()),
            team_id: self.team_id.clone(),
            not_after: self.certificate.not_after().to_string(),
            intermediate_subject: format_name(self.intermediate.subject_name()),
            key_source: self.key_source,
        }
    }
}

/// Human-readable facts about loaded credentials, safe to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    pub subject: String,
    pub team_id: Option<String>,
    pub not_after: String,
    pub intermediate_subject: String,
    pub key_source: &'static str,
}

/// Extract team ID from certificate subject
fn extract_team_id(cert: &X509) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::ORGANIZATIONALUNITNAME)
        .find_map(|entry| entry_text(entry.data()))
}

/// Entry value as text. Raw bytes are used so embedded NULs are kept.
fn entry_text(data: &Asn1StringRef) -> Option<String> {
    std::str::from_utf8(data.as_slice()).ok().map(str::to_string)
}

fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .filter_map(|entry| {
            let key = entry.object().nid().short_name().ok()?;
            let value = entry_text(entry.data())?;
            Some(format!("{key}={value}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
