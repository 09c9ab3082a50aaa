//! Pass bundle handling.
//!
//! This module provides functionality to:
//! - Provision the image assets every pass needs ([`assets`])
//! - Hash bundle files into `manifest.json` ([`manifest`])
//! - Zip the working directory into a `.pkpass` ([`archive`])
//!
//! # Bundle Layout
//!
//! | File | Description |
//! |------|-------------|
//! | `pass.json` | Pass descriptor |
//! | `icon*.png`, `logo*.png` | Required image assets |
//! | `manifest.json` | SHA-1 of every file above |
//! | `signature` | PKCS#7 detached signature over `manifest.json` |

pub mod archive;
pub mod assets;
pub mod manifest;

pub use archive::{create_pkpass, CompressionLevel};
pub use assets::{provision, AssetSource, DirectoryAssets, PassAsset, PlaceholderAssets, REQUIRED_ASSETS};
pub use manifest::{sha1_hex, Manifest, ManifestBuilder, MANIFEST_JSON, PASS_JSON, SIGNATURE_FILE};
