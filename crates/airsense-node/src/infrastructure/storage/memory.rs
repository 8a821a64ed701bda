//! In-memory flash filesystem for tests.
//!
//! `MemoryFlash` keeps its files in a shared table behind `Arc<Mutex<..>>`.
//! Cloning it yields a second handle to the same table, so a test can give
//! one handle to the [`SettingsStore`](crate::application::settings_store::SettingsStore)
//! and keep another to seed files, flip failure switches, and inspect what
//! was written.
//!
//! # Failure switches
//!
//! - `fail_mount` – every mount fails, even after a format.
//! - `unformatted` – mounts fail until `format` has been called once, like
//!   a fresh flash chip.
//! - `fail_open_read` / `fail_open_write` – `open` fails for that mode.
//! - `fail_read` – `read_to_end` on a file opened for reading fails.
//! - `fail_write` – `write_all` on an open file fails.
//! - `fail_close` – `close` on a file opened for writing fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::settings_store::{FlashFile, FlashFilesystem, FsError, OpenMode};

#[derive(Debug, Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    formatted: bool,
    mounted: bool,
    mount_calls: usize,
    format_calls: usize,
    fail_mount: bool,
    fail_open_read: bool,
    fail_open_write: bool,
    fail_read: bool,
    fail_write: bool,
    fail_close: bool,
}

/// Shared in-memory flash filesystem.
#[derive(Debug, Clone)]
pub struct MemoryFlash {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFlash {
    /// A formatted, empty filesystem.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                formatted: true,
                ..State::default()
            })),
        }
    }

    /// A filesystem that will not mount until it has been formatted.
    pub fn unformatted() -> Self {
        let flash = Self::new();
        flash.lock().formatted = false;
        flash
    }

    /// Builder form of [`MemoryFlash::put_file`].
    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.put_file(path, content);
        self
    }

    /// Stores `content` at `path`, replacing any existing file.
    pub fn put_file(&self, path: &str, content: &[u8]) {
        self.lock().files.insert(path.to_string(), content.to_vec());
    }

    /// Returns a copy of the file at `path`.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Number of `mount` calls so far, failed ones included.
    pub fn mount_calls(&self) -> usize {
        self.lock().mount_calls
    }

    /// Number of `format` calls so far.
    pub fn format_calls(&self) -> usize {
        self.lock().format_calls
    }

    /// Makes every `mount` fail, even after a format.
    pub fn set_fail_mount(&self, fail: bool) {
        self.lock().fail_mount = fail;
    }

    /// Makes `open` in read mode fail.
    pub fn set_fail_open_read(&self, fail: bool) {
        self.lock().fail_open_read = fail;
    }

    /// Makes `open` in write mode fail.
    pub fn set_fail_open_write(&self, fail: bool) {
        self.lock().fail_open_write = fail;
    }

    /// Makes reads from files opened afterwards fail.
    pub fn set_fail_read(&self, fail: bool) {
        self.lock().fail_read = fail;
    }

    /// Makes `write_all` fail.
    pub fn set_fail_write(&self, fail: bool) {
        self.lock().fail_write = fail;
    }

    /// Makes `close` on a written file fail.
    pub fn set_fail_close(&self, fail: bool) {
        self.lock().fail_close = fail;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the table from the others.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlashFilesystem for MemoryFlash {
    fn mount(&mut self) -> Result<(), FsError> {
        let mut state = self.lock();
        state.mount_calls += 1;
        if state.fail_mount {
            return Err(FsError::Device("simulated mount failure".to_string()));
        }
        if !state.formatted {
            return Err(FsError::NotMounted);
        }
        state.mounted = true;
        Ok(())
    }

    fn format(&mut self) -> Result<(), FsError> {
        let mut state = self.lock();
        state.format_calls += 1;
        state.files.clear();
        state.formatted = true;
        state.mounted = false;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> bool {
        let state = self.lock();
        state.mounted && state.files.contains_key(path)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn FlashFile>, FsError> {
        let mut state = self.lock();
        if !state.mounted {
            return Err(FsError::NotMounted);
        }
        match mode {
            OpenMode::Read => {
                if state.fail_open_read {
                    return Err(FsError::Device("simulated open failure".to_string()));
                }
                let content = state
                    .files
                    .get(path)
                    .cloned()
                    .ok_or_else(|| FsError::Device(format!("{path}: no such file")))?;
                Ok(Box::new(ReadFile {
                    content,
                    position: 0,
                    fail_read: state.fail_read,
                }))
            }
            OpenMode::Write => {
                if state.fail_open_write {
                    return Err(FsError::Device("simulated open failure".to_string()));
                }
                state.files.insert(path.to_string(), Vec::new());
                Ok(Box::new(WriteFile {
                    state: Arc::clone(&self.state),
                    path: path.to_string(),
                }))
            }
        }
    }
}

struct ReadFile {
    content: Vec<u8>,
    position: usize,
    fail_read: bool,
}

impl FlashFile for ReadFile {
    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, FsError> {
        if self.fail_read {
            return Err(FsError::Device("simulated read failure".to_string()));
        }
        let rest = &self.content[self.position..];
        buf.extend_from_slice(rest);
        self.position = self.content.len();
        Ok(rest.len())
    }

    fn write_all(&mut self, _data: &[u8]) -> Result<(), FsError> {
        Err(FsError::Device("file opened for reading".to_string()))
    }

    fn close(self: Box<Self>) -> Result<(), FsError> {
        Ok(())
    }
}

struct WriteFile {
    state: Arc<Mutex<State>>,
    path: String,
}

impl FlashFile for WriteFile {
    fn size(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.files.get(&self.path).map_or(0, |f| f.len() as u64)
    }

    fn read_to_end(&mut self, _buf: &mut Vec<u8>) -> Result<usize, FsError> {
        Err(FsError::Device("file opened for writing".to_string()))
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fail_write {
            return Err(FsError::Device("simulated write failure".to_string()));
        }
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), FsError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fail_close {
            return Err(FsError::Device("simulated close failure".to_string()));
        }
        Ok(())
    }
}
