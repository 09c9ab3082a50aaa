//! Deployment configuration.
//!
//! Signing material arrives base64-encoded through the environment. When
//! either certificate is absent the service runs with
//! [`SigningIdentity::DevelopmentPlaceholder`]. That choice is made here,
//! once, and never re-evaluated inside the signer.

use crate::crypto::SigningIdentity;
use crate::pass::PassTemplate;
use crate::{Error, Result};
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

pub const ENV_CERT_BASE64: &str = "PKPASS_CERT_BASE64";
pub const ENV_WWDR_BASE64: &str = "PKPASS_WWDR_BASE64";
pub const ENV_CERT_PASSWORD: &str = "PKPASS_CERT_PASSWORD";
pub const ENV_TEAM_ID: &str = "PKPASS_TEAM_ID";
pub const ENV_PASS_TYPE_ID: &str = "PKPASS_PASS_TYPE_ID";
pub const ENV_WEBHOOK_SECRET: &str = "PKPASS_WEBHOOK_SECRET";

/// Team id used when none is configured.
pub const DEVELOPMENT_TEAM_ID: &str = "DEVTEAM000";

#[derive(Debug, Default)]
pub struct WalletConfig {
    /// Base64 PKCS#12 signing identity.
    pub certificate_base64: Option<SecretString>,
    /// Base64 wallet intermediate certificate (PEM or DER inside).
    pub intermediate_base64: Option<String>,
    pub certificate_password: Option<SecretString>,
    pub team_identifier: Option<String>,
    pub pass_type_identifier: Option<String>,
    pub webhook_secret: Option<SecretString>,
}

impl WalletConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            certificate_base64: get(ENV_CERT_BASE64).map(SecretString::new),
            intermediate_base64: get(ENV_WWDR_BASE64),
            certificate_password: get(ENV_CERT_PASSWORD).map(SecretString::new),
            team_identifier: get(ENV_TEAM_ID),
            pass_type_identifier: get(ENV_PASS_TYPE_ID),
            webhook_secret: get(ENV_WEBHOOK_SECRET).map(SecretString::new),
        }
    }

    pub fn team_identifier(&self) -> &str {
        self.team_identifier.as_deref().unwrap_or(DEVELOPMENT_TEAM_ID)
    }

    pub fn pass_type_identifier(&self) -> String {
        self.pass_type_identifier
            .clone()
            .unwrap_or_else(|| format!("pass.{}.coffee-credits", self.team_identifier()))
    }

    pub fn template(&self) -> PassTemplate {
        PassTemplate::new(self.pass_type_identifier(), self.team_identifier())
    }

    pub fn has_signing_certificate(&self) -> bool {
        self.certificate_base64.is_some()
    }

    pub fn has_intermediate_certificate(&self) -> bool {
        self.intermediate_base64.is_some()
    }

    /// Selects the signing identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a certificate variable is set but is not
    /// valid base64.
    pub fn signing_identity(&self) -> Result<SigningIdentity> {
        let (Some(cert), Some(intermediate)) = (&self.certificate_base64, &self.intermediate_base64)
        else {
            return Ok(SigningIdentity::DevelopmentPlaceholder);
        };

        let pkcs12 = decode_base64(ENV_CERT_BASE64, cert.expose_secret())?;
        let intermediate = decode_base64(ENV_WWDR_BASE64, intermediate)?;
        let passphrase = self
            .certificate_password
            .as_ref()
            .map(|p| p.expose_secret().clone())
            .unwrap_or_default();

        Ok(SigningIdentity::production(pkcs12, passphrase, intermediate))
    }
}

/// Decodes standard base64, ignoring embedded whitespace and line breaks.
fn decode_base64(name: &str, value: &str) -> Result<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| Error::Config(format!("{name} is not valid base64: {e}")))
}
