//! `.pkpass` archive creation.
//!
//! A pass archive is a flat ZIP: `pass.json`, `manifest.json`, `signature`
//! and the image assets all sit at the archive root, with no directory
//! entries.
//!
//! # Examples
//!
//! ```no_run
//! use pkpass::bundle::{create_pkpass, CompressionLevel};
//!
//! create_pkpass("work/42-1700000000000", "passes/42-1700000000000.pkpass", CompressionLevel::MAX)?;
//! # Ok::<(), pkpass::Error>(())
//! ```

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for pass archives.
///
/// # Examples
///
/// ```
/// use pkpass::bundle::CompressionLevel;
///
/// assert_eq!(CompressionLevel::MAX.level(), 9);
/// assert_eq!(CompressionLevel::new(15).level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0). Entries are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default deflate level (6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum compression (level 9). Used for every generated pass.
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Zips every regular file at the root of `work_dir` into `output_path`.
///
/// Entries are written in sorted name order so identical inputs give
/// identical archives apart from timestamps.
///
/// # Errors
///
/// Returns [`Error::Io`] if `work_dir` is not a directory or any file cannot
/// be read or written, and [`Error::Zip`] if the archive cannot be finalized.
pub fn create_pkpass(
    work_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<()> {
    let work_dir = work_dir.as_ref();
    let output_path = output_path.as_ref();

    if !work_dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Pass working directory not found: {}", work_dir.display()),
        )));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let options = if compression_level.level() == 0 {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level.level() as i64))
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(work_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| Error::Io(io::Error::other(format!("Failed to walk directory: {e}"))))?;
        // Nested directories and symlinks have no place in a pass bundle.
        if entry.file_type().is_file() {
            entries.push(entry);
        }
    }

    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);

    for entry in &entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let data = fs::read(entry.path())?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&data)?;
    }

    zip.finish()?;

    tracing::debug!(
        files = entries.len(),
        output = %output_path.display(),
        "packaged pass archive"
    );
    Ok(())
}
