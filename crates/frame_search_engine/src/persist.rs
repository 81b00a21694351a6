use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory missing or not writable: {0}")]
    TargetDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create the download directory if needed and check that it accepts files.
pub fn ensure_download_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::TargetDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::TargetDir(e.to_string()))?;
        }
        Err(err) => return Err(PersistError::TargetDir(err.to_string())),
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::TargetDir(e.to_string()))?;
    Ok(())
}

/// Writes whole files into one directory through a temp file and a rename,
/// so readers never observe a partially written image.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_download_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // `persist` does not replace an existing file on every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
