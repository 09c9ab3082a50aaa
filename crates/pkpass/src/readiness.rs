//! Signing readiness check behind the configuration test endpoint.

use crate::config::WalletConfig;
use crate::crypto::SigningIdentity;
use serde::Serialize;

/// What the deployment can and cannot do right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub identity_loadable: bool,
    pub signing_certificate_present: bool,
    pub intermediate_certificate_present: bool,
    pub passphrase_provided: bool,
    pub webhook_secret_configured: bool,
    pub team_identifier: String,
    pub pass_type_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<CertificateValidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateValidation {
    pub subject: String,
    pub certificate_team_id: Option<String>,
    pub team_id_matches: bool,
    pub not_after: String,
    pub intermediate_subject: String,
    pub key_source: String,
}

impl ReadinessReport {
    /// Decodes and parses the configured identity without signing anything.
    pub fn check(config: &WalletConfig) -> Self {
        let team_identifier = config.team_identifier().to_string();
        let mut report = Self {
            identity_loadable: false,
            signing_certificate_present: config.has_signing_certificate(),
            intermediate_certificate_present: config.has_intermediate_certificate(),
            passphrase_provided: config.certificate_password.is_some(),
            webhook_secret_configured: config.webhook_secret.is_some(),
            pass_type_identifier: config.pass_type_identifier(),
            team_identifier,
            validation: None,
            error: None,
        };

        let identity = match config.signing_identity() {
            Ok(SigningIdentity::DevelopmentPlaceholder) => {
                report.error = Some(
                    "signing certificate and intermediate certificate are both required; \
                     passes will carry placeholder signatures"
                        .into(),
                );
                return report;
            }
            Ok(identity) => identity,
            Err(e) => {
                report.error = Some(e.to_string());
                return report;
            }
        };

        match identity.load_credentials() {
            Ok(credentials) => {
                let summary = credentials.summary();
                report.identity_loadable = true;
                report.validation = Some(CertificateValidation {
                    team_id_matches: summary.team_id.as_deref() == Some(report.team_identifier.as_str()),
                    subject: summary.subject,
                    certificate_team_id: summary.team_id,
                    not_after: summary.not_after,
                    intermediate_subject: summary.intermediate_subject,
                    key_source: summary.key_source.to_string(),
                });
            }
            Err(e) => report.error = Some(e.to_string()),
        }

        report
    }

    /// Passes generated now would carry a real signature.
    pub fn is_ready(&self) -> bool {
        self.identity_loadable
    }
}
