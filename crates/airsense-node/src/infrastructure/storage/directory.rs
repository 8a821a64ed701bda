//! Host directory standing in for the device's flash filesystem.
//!
//! Flash paths are resolved relative to a root directory, so `/config.json`
//! becomes `<root>/config.json`.  The root plays the role of the flash
//! partition:
//!
//! - `mount` succeeds iff the root directory exists.
//! - `format` deletes the root and recreates it empty.
//!
//! This keeps the first-save behaviour of the device: saving into a root that
//! does not exist yet fails to mount, formats, and then succeeds.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::settings_store::{FlashFile, FlashFilesystem, FsError, OpenMode};

/// A flash filesystem backed by a host directory.
#[derive(Debug)]
pub struct DirectoryFlash {
    root: PathBuf,
    mounted: bool,
}

impl DirectoryFlash {
    /// A filesystem rooted at `root`.  Nothing is touched until `mount`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    /// The directory that plays the flash partition.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl FlashFilesystem for DirectoryFlash {
    fn mount(&mut self) -> Result<(), FsError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                self.mounted = true;
                Ok(())
            }
            Ok(_) => Err(FsError::Device(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FsError::NotMounted),
            Err(e) => Err(FsError::Io(e)),
        }
    }

    fn format(&mut self) -> Result<(), FsError> {
        debug!("formatting flash directory {}", self.root.display());
        self.mounted = false;
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(FsError::Io(e)),
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> bool {
        self.mounted && self.resolve(path).is_file()
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn FlashFile>, FsError> {
        if !self.mounted {
            return Err(FsError::NotMounted);
        }
        let full = self.resolve(path);
        let file = match mode {
            OpenMode::Read => File::open(&full)?,
            OpenMode::Write => File::create(&full)?,
        };
        let size = file.metadata()?.len();
        Ok(Box::new(DirectoryFile { file, size }))
    }
}

struct DirectoryFile {
    file: File,
    size: u64,
}

impl FlashFile for DirectoryFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, FsError> {
        Ok(self.file.read_to_end(buf)?)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), FsError> {
        Ok(self.file.write_all(data)?)
    }

    fn close(mut self: Box<Self>) -> Result<(), FsError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
