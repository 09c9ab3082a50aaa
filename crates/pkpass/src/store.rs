//! On-disk layout for generated passes.
//!
//! ```text
//! <root>/work/<pass id>/      per-generation working directory (removed after packaging)
//! <root>/passes/<pass id>.pkpass
//! ```
//!
//! Pass ids are `<user id>-<stamp>`, where the stamp is a millisecond
//! timestamp that is strictly increasing within the process. Two overlapping
//! generations in one process therefore never share a working directory.
//! Separate processes writing to the same root rely on wall-clock uniqueness
//! alone.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Generation timestamp in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassStamp(u64);

impl PassStamp {
    /// Current wall-clock time, bumped past the previously issued stamp when
    /// two calls land in the same millisecond.
    pub fn next() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut last = LAST_STAMP.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return Self(candidate),
                Err(actual) => last = actual,
            }
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn millis(self) -> u64 {
        self.0
    }
}

/// Identifier of one generated pass file.
pub fn pass_id(user_id: u64, stamp: PassStamp) -> String {
    format!("{}-{}", user_id, stamp.millis())
}

fn is_valid_pass_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.bytes().all(|b| b.is_ascii_digit() || b == b'-')
}

#[derive(Debug, Clone)]
pub struct PassStore {
    root: PathBuf,
}

impl PassStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn work_dir(&self, pass_id: &str) -> PathBuf {
        self.root.join("work").join(pass_id)
    }

    pub fn pass_path(&self, pass_id: &str) -> PathBuf {
        self.root.join("passes").join(format!("{pass_id}.pkpass"))
    }

    /// Creates a fresh, empty working directory for `pass_id`.
    pub fn create_work_dir(&self, pass_id: &str) -> Result<PathBuf> {
        let dir = self.work_dir(pass_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Removes the working directory. Missing directories are not an error.
    pub fn discard_work_dir(&self, pass_id: &str) -> Result<()> {
        match fs::remove_dir_all(self.work_dir(pass_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a stored `.pkpass`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PassNotFound`] for malformed ids and ids with no file.
    pub fn open(&self, pass_id: &str) -> Result<Vec<u8>> {
        if !is_valid_pass_id(pass_id) {
            return Err(Error::PassNotFound(pass_id.to_string()));
        }
        match fs::read(self.pass_path(pass_id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::PassNotFound(pass_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
