//! Image assets required by the pass bundle format.
//!
//! A bundle without every file in [`REQUIRED_ASSETS`] is rejected by wallet
//! readers. Devices render icons at 29/58/87pt and logos at 160x50, 320x100
//! and 480x150pt, but any valid PNG is accepted into the bundle.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Asset filenames every pass bundle must contain.
pub const REQUIRED_ASSETS: [&str; 6] = [
    "icon.png",
    "icon@2x.png",
    "icon@3x.png",
    "logo.png",
    "logo@2x.png",
    "logo@3x.png",
];

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Transparent 1x1 RGBA PNG.
pub const PLACEHOLDER_PNG: [u8; 68] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0xe9, 0xfa, 0xdc, 0xd8, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44,
    0xae, 0x42, 0x60, 0x82,
];

/// One image destined for the bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassAsset {
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Supplies the bytes of every required asset.
pub trait AssetSource: Send + Sync {
    fn load(&self) -> Result<Vec<PassAsset>>;
}

/// Development art: the same 1x1 PNG under every required name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAssets;

impl AssetSource for PlaceholderAssets {
    fn load(&self) -> Result<Vec<PassAsset>> {
        Ok(REQUIRED_ASSETS
            .into_iter()
            .map(|name| PassAsset {
                name,
                bytes: PLACEHOLDER_PNG.to_vec(),
            })
            .collect())
    }
}

/// Branded art read from a directory holding files named as in [`REQUIRED_ASSETS`].
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    dir: PathBuf,
}

impl DirectoryAssets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self) -> Result<Vec<PassAsset>> {
        REQUIRED_ASSETS
            .into_iter()
            .map(|name| {
                let path = self.dir.join(name);
                let bytes = fs::read(&path).map_err(|e| Error::Asset {
                    name: name.to_string(),
                    reason: format!("cannot read {}: {}", path.display(), e),
                })?;
                if !is_png(&bytes) {
                    return Err(Error::Asset {
                        name: name.to_string(),
                        reason: "not a PNG file".into(),
                    });
                }
                Ok(PassAsset { name, bytes })
            })
            .collect()
    }
}

/// Writes every asset from `source` into `work_dir`.
pub fn provision(source: &dyn AssetSource, work_dir: &Path) -> Result<Vec<&'static str>> {
    let assets = source.load()?;
    let mut written = Vec::with_capacity(assets.len());
    for asset in assets {
        fs::write(work_dir.join(asset.name), &asset.bytes)?;
        written.push(asset.name);
    }
    tracing::debug!(count = written.len(), dir = %work_dir.display(), "provisioned pass assets");
    Ok(written)
}
