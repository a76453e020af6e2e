use crate::error::OutputError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Plain-text output file filled block by block as the paper is written
#[derive(Debug)]
pub struct DocumentWriter {
    path: PathBuf,
}

impl DocumentWriter {
    /// Create `<dir>/<request_id>.txt`, truncating any previous file
    pub fn create(dir: &Path, request_id: &str) -> Result<Self, OutputError> {
        fs::create_dir_all(dir).map_err(OutputError::CreateDir)?;
        let path = dir.join(format!("{}.txt", request_id));
        fs::write(&path, "").map_err(OutputError::Write)?;
        Ok(Self { path })
    }

    pub fn append(&mut self, block: &str) -> Result<(), OutputError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(OutputError::Write)?;
        file.write_all(block.as_bytes()).map_err(OutputError::Write)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
