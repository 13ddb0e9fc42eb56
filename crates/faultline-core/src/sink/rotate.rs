//! Size-capped append writer
//!
//! When the next write would push `<path>` past the limit, the current file
//! is renamed to `<path>.1` (replacing any older backup) and a fresh file is
//! started. A single write larger than the limit still lands whole in an
//! otherwise empty file.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Rotation limit of `faultline.log` and `faultline.json`
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10_000_000;

/// Rotation limit of behavior-specified destinations
pub const DEFAULT_AUXILIARY_MAX_BYTES: u64 = 5_000_000;

#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: Option<u64>,
    file: File,
    size: u64,
}

impl RotatingFile {
    /// Open `path` for appending, creating parent directories
    ///
    /// `max_bytes` of `None` disables rotation.
    ///
    /// # Errors
    ///
    /// Any I/O error from creating the directory or opening the file.
    pub fn open(path: impl AsRef<Path>, max_bytes: Option<u64>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = append_to(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            file,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    pub fn set_max_bytes(&mut self, max_bytes: Option<u64>) {
        self.max_bytes = max_bytes;
    }

    /// Bytes in the current file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Where the previous file goes on rotation
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".1");
        PathBuf::from(name)
    }

    fn needs_rotation(&self, incoming: u64) -> bool {
        match self.max_bytes {
            Some(limit) => self.size > 0 && self.size + incoming > limit,
            None => false,
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, self.backup_path())?;
        self.file = append_to(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    /// Writes `buf` whole, rotating first if it would overflow the limit
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        if self.needs_rotation(incoming) {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.size += incoming;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
