//! Error types for pass generation.
//!
//! This module defines the [`enum@Error`] enum covering every failure in the
//! pipeline: I/O, archive writing, certificate parsing, configuration and
//! descriptor validation.
//!
//! Signing failures are deliberately absent from the generation path: the
//! [`Signer`](crate::crypto::Signer) degrades to a placeholder signature
//! instead of returning [`Error::Signing`].
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use crate::pass::Violation;
use thiserror::Error;

/// Error type for pass generation.
///
/// # Examples
///
/// ```no_run
/// use pkpass::{AccountSnapshot, Error};
///
/// match AccountSnapshot::new(7, "bob", f64::NAN) {
///     Err(Error::InvalidBalance(msg)) => eprintln!("rejected: {msg}"),
///     Err(e) => eprintln!("other error: {e}"),
///     Ok(_) => {}
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Occurs when writing the working directory, reading assets, or writing
    /// the packaged archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive operation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization of `pass.json` or `manifest.json` failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or malformed certificate, PKCS#12 container or private key.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// The PKCS#12 passphrase did not verify against the container MAC.
    #[error("Invalid password for PKCS#12")]
    InvalidPassword,

    /// PKCS#7 signature generation failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Configuration value present but unusable (bad base64, bad template).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Balance is not a finite, non-negative amount.
    #[error("Invalid balance: {0}")]
    InvalidBalance(String),

    /// The pass descriptor failed validation.
    ///
    /// Carries every violation found, not only the first.
    #[error("Pass validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// An image asset is missing or is not a PNG.
    #[error("Invalid asset {name}: {reason}")]
    Asset {
        /// Bundle filename of the asset.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A file the bundle format requires is not in the working directory.
    #[error("Missing bundle file: {0}")]
    MissingBundleFile(String),

    /// No stored pass exists for the given id.
    #[error("Pass not found: {0}")]
    PassNotFound(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
