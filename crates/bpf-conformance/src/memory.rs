//! Memory provisioner: scoped temporary files holding a fixture's `mem`
//! image.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::HarnessError;

/// A memory image on disk. The file is removed when this value drops.
#[derive(Debug)]
pub struct MemoryImage {
    file: NamedTempFile,
}

impl MemoryImage {
    /// Write `bytes` to a fresh temporary file and flush it to disk.
    pub fn create(bytes: &[u8]) -> Result<Self, HarnessError> {
        let mut file = tempfile::Builder::new()
            .prefix("bpf-mem-")
            .tempfile()
            .map_err(HarnessError::MemoryImage)?;
        file.write_all(bytes).map_err(HarnessError::MemoryImage)?;
        file.flush().map_err(HarnessError::MemoryImage)?;
        file.as_file().sync_all().map_err(HarnessError::MemoryImage)?;
        log::debug!("memory image {} ({} bytes)", file.path().display(), bytes.len());
        Ok(Self { file })
    }

    /// `None` in, no file out.
    pub fn provision(bytes: Option<&[u8]>) -> Result<Option<Self>, HarnessError> {
        bytes.map(Self::create).transpose()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
