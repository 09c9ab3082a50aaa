//! Pass generation pipeline.
//!
//! One call to [`PassGenerator::generate`] runs, in order: build the
//! descriptor, validate it, provision a working directory, hash it into a
//! manifest, sign the manifest, zip the bundle and base64-encode the result.
//! The working directory is removed whether or not the run succeeds.

use crate::bundle::{
    create_pkpass, provision, AssetSource, CompressionLevel, Manifest, ManifestBuilder,
    PlaceholderAssets, MANIFEST_JSON, PASS_JSON, SIGNATURE_FILE,
};
use crate::crypto::{SignatureKind, Signer, SigningIdentity};
use crate::delivery::encode_pass;
use crate::pass::{validate, AccountSnapshot, PassOverrides, PassTemplate, Violation};
use crate::store::{pass_id, PassStamp, PassStore};
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Wallet pass generator with a builder-style API.
///
/// # Example
///
/// ```no_run
/// use pkpass::{AccountSnapshot, PassGenerator, PassStore, PassTemplate, SigningIdentity};
///
/// let generator = PassGenerator::new(
///     PassTemplate::new("pass.ABCDE12345.coffee", "ABCDE12345"),
///     SigningIdentity::DevelopmentPlaceholder,
///     PassStore::new("/var/lib/pkpass"),
/// );
/// let pass = generator.generate(&AccountSnapshot::new(42, "alice", 75.50)?, None)?;
/// println!("{} -> {}", pass.serial_number, pass.path.display());
/// # Ok::<(), pkpass::Error>(())
/// ```
pub struct PassGenerator {
    template: PassTemplate,
    signer: Signer,
    store: PassStore,
    assets: Box<dyn AssetSource>,
    compression_level: CompressionLevel,
}

impl PassGenerator {
    /// Create a generator using placeholder art and maximum compression.
    pub fn new(template: PassTemplate, identity: SigningIdentity, store: PassStore) -> Self {
        Self {
            template,
            signer: Signer::new(identity),
            store,
            assets: Box::new(PlaceholderAssets),
            compression_level: CompressionLevel::MAX,
        }
    }

    /// Replace the image asset source.
    pub fn assets(mut self, source: impl AssetSource + 'static) -> Self {
        self.assets = Box::new(source);
        self
    }

    /// Set ZIP compression level for the archive (0-9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = CompressionLevel::new(level);
        self
    }

    pub fn template(&self) -> &PassTemplate {
        &self.template
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn store(&self) -> &PassStore {
        &self.store
    }

    /// Generate, sign and package a pass for `account`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the descriptor (after `overrides`)
    /// is not acceptable, and I/O, asset or archive errors from the later
    /// stages. Signing problems do not fail the call; they show up as
    /// [`SignatureKind::Placeholder`] on the result.
    pub fn generate(
        &self,
        account: &AccountSnapshot,
        overrides: Option<&PassOverrides>,
    ) -> Result<GeneratedPass> {
        let stamp = PassStamp::next();
        let id = pass_id(account.user_id(), stamp);

        let mut descriptor = self.template.build(account, stamp);
        if let Some(overrides) = overrides {
            overrides.apply(&mut descriptor);
        }
        validate(&descriptor).into_result()?;

        let work_dir = self.store.create_work_dir(&id)?;
        let output = self.store.pass_path(&id);
        let packaged = self.package(&work_dir, &descriptor.to_json_bytes()?, &output);

        if let Err(e) = self.store.discard_work_dir(&id) {
            tracing::warn!(pass_id = %id, error = %e, "failed to remove working directory");
        }
        let (manifest, signature) = packaged?;

        let pass_base64 = encode_pass(&output)?;
        tracing::info!(
            pass_id = %id,
            serial = %descriptor.serial_number,
            user_id = account.user_id(),
            signed = signature == SignatureKind::Signed,
            "generated pass"
        );

        Ok(GeneratedPass {
            pass_id: id,
            serial_number: descriptor.serial_number,
            path: output,
            pass_base64,
            signature,
            manifest,
        })
    }

    /// Writes the bundle into `work_dir` and zips it to `output`.
    fn package(
        &self,
        work_dir: &Path,
        pass_json: &[u8],
        output: &Path,
    ) -> Result<(Manifest, SignatureKind)> {
        fs::write(work_dir.join(PASS_JSON), pass_json)?;
        provision(self.assets.as_ref(), work_dir)?;

        let manifest = ManifestBuilder::new(work_dir).scan()?.build()?;
        let manifest_bytes = manifest.to_json_bytes()?;
        fs::write(work_dir.join(MANIFEST_JSON), &manifest_bytes)?;
        tracing::debug!(files = manifest.len(), "wrote manifest");

        let signature = self.signer.sign(&manifest_bytes);
        fs::write(work_dir.join(SIGNATURE_FILE), &signature.bytes)?;

        create_pkpass(work_dir, output, self.compression_level)?;
        tracing::debug!(output = %output.display(), "packaged pass");

        Ok((manifest, signature.kind))
    }

    /// Like [`generate`](Self::generate), but folds every failure into a
    /// [`GenerationResult`] instead of returning `Err`.
    pub fn generate_result(
        &self,
        user_id: u64,
        username: &str,
        balance: f64,
        overrides: Option<&PassOverrides>,
    ) -> GenerationResult {
        let outcome = AccountSnapshot::new(user_id, username, balance)
            .and_then(|account| self.generate(&account, overrides));
        match outcome {
            Ok(pass) => GenerationResult::from(pass),
            Err(e) => {
                tracing::error!(user_id, error = %e, "pass generation failed");
                GenerationResult::failure(e)
            }
        }
    }
}

/// A packaged pass on disk.
#[derive(Debug, Clone)]
pub struct GeneratedPass {
    pub pass_id: String,
    pub serial_number: String,
    /// Location of the `.pkpass` inside the store.
    pub path: PathBuf,
    pub pass_base64: String,
    pub signature: SignatureKind,
    pub manifest: Manifest,
}

impl GeneratedPass {
    pub fn is_signed(&self) -> bool {
        self.signature == SignatureKind::Signed
    }
}

/// Coarse failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    InvalidBalance,
    Generation,
}

impl ErrorKind {
    pub fn of(error: &Error) -> Self {
        match error {
            Error::Validation(_) => Self::Validation,
            Error::InvalidBalance(_) => Self::InvalidBalance,
            _ => Self::Generation,
        }
    }
}

/// Outcome of a generation attempt as plain data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_reason: Option<String>,
}

impl GenerationResult {
    pub fn failure(error: Error) -> Self {
        let error_kind = ErrorKind::of(&error);
        let message = error.to_string();
        let violations = match error {
            Error::Validation(violations) => violations,
            _ => Vec::new(),
        };
        Self {
            success: false,
            error: Some(message),
            error_kind: Some(error_kind),
            violations,
            pass_base64: None,
            pass_id: None,
            serial_number: None,
            signed: false,
            placeholder_reason: None,
        }
    }
}

impl From<GeneratedPass> for GenerationResult {
    fn from(pass: GeneratedPass) -> Self {
        let placeholder_reason = match &pass.signature {
            SignatureKind::Signed => None,
            SignatureKind::Placeholder { reason } => Some(reason.clone()),
        };
        Self {
            success: true,
            error: None,
            error_kind: None,
            violations: Vec::new(),
            signed: placeholder_reason.is_none(),
            placeholder_reason,
            pass_base64: Some(pass.pass_base64),
            pass_id: Some(pass.pass_id),
            serial_number: Some(pass.serial_number),
        }
    }
}
