//! SettingsStore: owns the device settings and mediates their persistence.
//!
//! The store is created once at startup and handed by reference to whatever
//! needs the settings (WiFi manager, MQTT client, LED controller, admin
//! page).  It holds three things:
//!
//! - The current [`Settings`] value.
//! - A dirty flag, set by any setter that actually changes a value and
//!   cleared by a successful [`SettingsStore::load`] or [`SettingsStore::save`].
//! - The [`ErrorKind`] of the last failed load or save, if any.
//!
//! # Failure model
//!
//! Persistence failures are never fatal.  `load` and `save` return a
//! [`StoreError`] and also record its kind in [`SettingsStore::last_error`],
//! and the device keeps running with whatever is in memory (the factory
//! defaults if nothing was ever loaded).  A failed call leaves the settings
//! and the dirty flag untouched.
//!
//! # Flash access
//!
//! The store talks to storage through the [`FlashFilesystem`] trait, so the
//! same code runs against the real flash driver, a host directory, or an
//! in-memory fake in tests.  Access is strictly sequential; the store is
//! only ever driven from the device's single control loop.

use airsense_core::{decode, encode, redacted_pretty, DocumentError, LedIntensity, Settings};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Location of the settings document on the flash filesystem.
pub const CONFIG_PATH: &str = "/config.json";

/// Error type for flash filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("filesystem not mounted")]
    NotMounted,
    #[error("flash device error: {0}")]
    Device(String),
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Creates the file, truncating any existing content.
    Write,
}

/// An open file on the flash filesystem.
pub trait FlashFile {
    /// Size of the file in bytes at the time it was opened.
    fn size(&self) -> u64;

    /// Reads the remaining content into `buf`, returning the byte count.
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, FsError>;

    /// Appends `data` to the file.
    fn write_all(&mut self, data: &[u8]) -> Result<(), FsError>;

    /// Flushes and releases the file.
    fn close(self: Box<Self>) -> Result<(), FsError>;
}

/// The flash filesystem the settings document lives on.
///
/// Implementations are in `infrastructure::storage`.
#[cfg_attr(test, mockall::automock)]
pub trait FlashFilesystem {
    /// Mounts the filesystem.  Must succeed before `exists` or `open`.
    fn mount(&mut self) -> Result<(), FsError>;

    /// Erases the filesystem and lays out an empty one.
    fn format(&mut self) -> Result<(), FsError>;

    /// Returns `true` if a file exists at `path`.
    fn exists(&mut self, path: &str) -> bool;

    /// Opens the file at `path`.
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn FlashFile>, FsError>;
}

/// Category of the last persistence failure, as reported by
/// [`SettingsStore::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The flash filesystem could not be mounted.
    FilesystemMount,
    /// `/config.json` does not exist.  Expected on first boot.
    FileNotFound,
    /// `/config.json` exists but could not be opened or read.
    FileOpen,
    /// `/config.json` could not be opened for writing or written.
    FileWrite,
    /// The stored document is not valid JSON (or could not be produced).
    JsonParse,
}

/// Error type for [`SettingsStore::load`] and [`SettingsStore::save`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to mount flash filesystem: {0}")]
    Mount(#[source] FsError),

    #[error("{path} not found")]
    NotFound { path: &'static str },

    #[error("cannot read {path}: {source}")]
    Open {
        path: &'static str,
        #[source]
        source: FsError,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: &'static str,
        #[source]
        source: FsError,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl StoreError {
    /// Maps the error onto the category recorded in `last_error`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Mount(_) => ErrorKind::FilesystemMount,
            StoreError::NotFound { .. } => ErrorKind::FileNotFound,
            StoreError::Open { .. } => ErrorKind::FileOpen,
            StoreError::Write { .. } => ErrorKind::FileWrite,
            StoreError::Document(_) => ErrorKind::JsonParse,
        }
    }
}

/// The device settings plus their persistence state.
pub struct SettingsStore<F> {
    fs: F,
    settings: Settings,
    dirty: bool,
    last_error: Option<ErrorKind>,
}

impl<F: FlashFilesystem> SettingsStore<F> {
    /// Creates a store holding the factory defaults.  Nothing is read until
    /// [`SettingsStore::load`] is called.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            settings: Settings::default(),
            dirty: false,
            last_error: None,
        }
    }

    /// Loads `/config.json` over the current settings.
    ///
    /// Keys present in the document replace the matching fields (intensities
    /// are clamped); absent keys keep their current value.  On success the
    /// dirty flag and `last_error` are cleared.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the filesystem cannot be mounted, the
    /// file is missing or unreadable, or its content is not a JSON object.
    /// The settings are left unchanged in every error case.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let result = self.try_load();
        match &result {
            Err(StoreError::NotFound { path }) => {
                info!("settings: no {path} found, running with factory defaults")
            }
            Err(e) => warn!("settings: load failed: {e}"),
            Ok(()) => info!("settings: loaded {CONFIG_PATH}"),
        }
        self.record(result)
    }

    fn try_load(&mut self) -> Result<(), StoreError> {
        debug!("settings: mounting flash filesystem");
        self.fs.mount().map_err(StoreError::Mount)?;

        if !self.fs.exists(CONFIG_PATH) {
            return Err(StoreError::NotFound { path: CONFIG_PATH });
        }

        debug!("settings: reading {CONFIG_PATH}");
        let open_error = |source| StoreError::Open {
            path: CONFIG_PATH,
            source,
        };
        let mut file = self.fs.open(CONFIG_PATH, OpenMode::Read).map_err(open_error)?;
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        let read = file.read_to_end(&mut bytes);
        if let Err(e) = file.close() {
            warn!("settings: failed to close {CONFIG_PATH} after reading: {e}");
        }
        read.map_err(open_error)?;

        let patch = decode(&bytes)?;
        patch.apply_to(&mut self.settings);
        if let Ok(text) = redacted_pretty(&self.settings) {
            debug!("settings: parsed json\n{text}");
        }
        Ok(())
    }

    /// Writes all settings to `/config.json`.
    ///
    /// If the filesystem does not mount, it is formatted once and the mount
    /// retried.  On success the dirty flag and `last_error` are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Mount`] if the filesystem still cannot be
    /// mounted after formatting, and [`StoreError::Write`] if the file cannot
    /// be opened for writing or written.  The dirty flag is left unchanged.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let result = self.try_save();
        match &result {
            Err(e) => warn!("settings: save failed: {e}"),
            Ok(()) => info!("settings: {CONFIG_PATH} saved"),
        }
        self.record(result)
    }

    fn try_save(&mut self) -> Result<(), StoreError> {
        let bytes = encode(&self.settings)?;

        if let Err(e) = self.fs.mount() {
            warn!("settings: mount failed ({e}), formatting flash filesystem");
            if let Err(e) = self.fs.format() {
                warn!("settings: format failed: {e}");
            }
            self.fs.mount().map_err(StoreError::Mount)?;
        }
        debug!("settings: mounted flash filesystem");

        let write_error = |source| StoreError::Write {
            path: CONFIG_PATH,
            source,
        };
        let mut file = self.fs.open(CONFIG_PATH, OpenMode::Write).map_err(write_error)?;
        let written = file.write_all(&bytes);
        let closed = file.close();
        written.and(closed).map_err(write_error)?;

        if let Ok(text) = redacted_pretty(&self.settings) {
            debug!("settings: wrote json\n{text}");
        }
        Ok(())
    }

    fn record(&mut self, result: Result<(), StoreError>) -> Result<(), StoreError> {
        match &result {
            Ok(()) => {
                self.dirty = false;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.kind()),
        }
        result
    }

    /// Restores every field to its factory default.
    ///
    /// Marks the store dirty if anything changed and returns whether it did.
    /// The flash copy is only replaced by a following [`SettingsStore::save`].
    pub fn factory_reset(&mut self) -> bool {
        let defaults = Settings::default();
        if self.settings == defaults {
            return false;
        }
        self.settings = defaults;
        self.dirty = true;
        true
    }
}

impl<F> SettingsStore<F> {
    /// Returns `true` if the settings changed since the last successful load
    /// or save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The kind of the last failed load or save, `None` after a success.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// The whole settings value.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Human-readable listing of every setting for the console.
    pub fn dump(&self) -> String {
        self.settings.to_string()
    }

    /// The flash filesystem the store persists to.
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Consumes the store and hands back its filesystem.
    pub fn into_filesystem(self) -> F {
        self.fs
    }

    /// Whether the device joins WiFi and reports over MQTT.
    pub fn use_wifi(&self) -> bool {
        self.settings.use_wifi
    }

    /// LED brightness during the day, 0 to 100.
    pub fn led_intensity_at_day(&self) -> LedIntensity {
        self.settings.led_intensity_at_day
    }

    /// LED brightness at night, 0 to 100.
    pub fn led_intensity_at_night(&self) -> LedIntensity {
        self.settings.led_intensity_at_night
    }

    /// Topic the PM2.5 readings are published to.
    pub fn mqtt_topic(&self) -> &str {
        &self.settings.mqtt_topic
    }

    /// Broker host name or address; empty when unset.
    pub fn mqtt_server(&self) -> &str {
        &self.settings.mqtt_server
    }

    /// Broker port as stored, not yet validated.
    pub fn mqtt_port(&self) -> &str {
        &self.settings.mqtt_port
    }

    /// Broker user name; empty for anonymous login.
    pub fn mqtt_username(&self) -> &str {
        &self.settings.mqtt_username
    }

    /// Broker password.
    pub fn mqtt_password(&self) -> &str {
        &self.settings.mqtt_password
    }

    // Setters return whether the value changed.  Assigning the current value
    // is a no-op and leaves the dirty flag alone.

    pub fn set_use_wifi(&mut self, use_wifi: bool) -> bool {
        replace(&mut self.settings.use_wifi, use_wifi, &mut self.dirty)
    }

    /// Sets the day intensity; values above 100 are clamped.
    pub fn set_led_intensity_at_day(&mut self, intensity: impl Into<LedIntensity>) -> bool {
        replace(
            &mut self.settings.led_intensity_at_day,
            intensity.into(),
            &mut self.dirty,
        )
    }

    /// Sets the night intensity; values above 100 are clamped.
    pub fn set_led_intensity_at_night(&mut self, intensity: impl Into<LedIntensity>) -> bool {
        replace(
            &mut self.settings.led_intensity_at_night,
            intensity.into(),
            &mut self.dirty,
        )
    }

    pub fn set_mqtt_topic(&mut self, topic: &str) -> bool {
        replace_text(&mut self.settings.mqtt_topic, topic, &mut self.dirty)
    }

    pub fn set_mqtt_server(&mut self, server: &str) -> bool {
        replace_text(&mut self.settings.mqtt_server, server, &mut self.dirty)
    }

    pub fn set_mqtt_port(&mut self, port: &str) -> bool {
        replace_text(&mut self.settings.mqtt_port, port, &mut self.dirty)
    }

    pub fn set_mqtt_username(&mut self, username: &str) -> bool {
        replace_text(&mut self.settings.mqtt_username, username, &mut self.dirty)
    }

    pub fn set_mqtt_password(&mut self, password: &str) -> bool {
        replace_text(&mut self.settings.mqtt_password, password, &mut self.dirty)
    }
}

fn replace<T: PartialEq>(field: &mut T, value: T, dirty: &mut bool) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    *dirty = true;
    true
}

fn replace_text(field: &mut String, value: &str, dirty: &mut bool) -> bool {
    if field == value {
        return false;
    }
    value.clone_into(field);
    *dirty = true;
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
