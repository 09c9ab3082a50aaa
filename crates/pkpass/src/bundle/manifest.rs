//! `manifest.json` generation.
//!
//! The manifest maps every bundle file to the SHA-1 hex digest of its bytes.
//! SHA-1 is dictated by the wallet pass format. The detached signature covers
//! the serialized manifest, so any edit to a file after [`ManifestBuilder::scan`]
//! invalidates the bundle.

use super::assets::REQUIRED_ASSETS;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const PASS_JSON: &str = "pass.json";
pub const MANIFEST_JSON: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "signature";

/// Filename to SHA-1 hex digest, in sorted filename order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Serialized bytes. These exact bytes are written and signed.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.0)?)
    }

    /// Errors with [`Error::MissingBundleFile`] for the first absent name.
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.0.contains_key(name) {
                return Err(Error::MissingBundleFile(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Lowercase SHA-1 hex of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Builder for `manifest.json` over a pass working directory.
pub struct ManifestBuilder {
    /// Working directory holding the bundle files
    work_dir: PathBuf,
    files: BTreeMap<String, String>,
}

impl ManifestBuilder {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            files: BTreeMap::new(),
        }
    }

    /// Files the manifest never lists: itself and the signature over it.
    fn should_exclude(name: &str) -> bool {
        name == MANIFEST_JSON || name == SIGNATURE_FILE
    }

    /// Hash every regular file at the root of the working directory.
    ///
    /// # Errors
    ///
    /// Read failures propagate. A bundle with an unreadable file cannot be
    /// signed.
    pub fn scan(&mut self) -> Result<&mut Self> {
        let entries: Vec<_> = WalkDir::new(&self.work_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Io(std::io::Error::other(format!("Failed to walk directory: {e}"))))?;

        let results: Vec<Result<(String, String)>> = entries
            .par_iter()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if Self::should_exclude(&name) {
                    return None;
                }
                Some(fs::read(entry.path()).map(|data| (name, sha1_hex(&data))).map_err(Error::from))
            })
            .collect();

        for result in results {
            let (name, digest) = result?;
            self.files.insert(name, digest);
        }

        Ok(self)
    }

    /// Record a file hash without touching the filesystem.
    pub fn add(&mut self, name: impl Into<String>, data: &[u8]) -> &mut Self {
        self.files.insert(name.into(), sha1_hex(data));
        self
    }

    /// Finish the manifest, checking that `pass.json` and every required
    /// asset are present.
    pub fn build(&self) -> Result<Manifest> {
        let manifest = Manifest(self.files.clone());
        manifest.require(std::iter::once(PASS_JSON).chain(REQUIRED_ASSETS))?;
        Ok(manifest)
    }
}
