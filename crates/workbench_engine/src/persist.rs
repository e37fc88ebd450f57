use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory unusable: {path}: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Directory that reports and session files are written into.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates the directory when missing and rejects a non-directory path.
    pub fn ensure(&self) -> Result<(), PersistError> {
        let unusable = |reason: String| PersistError::OutputDir {
            path: self.root.clone(),
            reason,
        };
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(unusable("not a directory".to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.root).map_err(|err| unusable(err.to_string()))
            }
            Err(err) => Err(unusable(err.to_string())),
        }
    }

    /// Writes `contents` through a sibling temp file so readers never observe
    /// a half-written file.
    pub fn write_atomic(&self, filename: &str, contents: &str) -> Result<PathBuf, PersistError> {
        self.ensure()?;
        let target = self.root.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read_optional(&self, filename: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.root.join(filename)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
