//! Application layer use cases for the sensor node.
//!
//! Code here depends on the [`settings_store::FlashFilesystem`] abstraction,
//! never on a concrete flash driver, so it runs unchanged against the device
//! filesystem, a host directory, or the in-memory fake used in tests.
//!
//! # Sub-modules
//!
//! - **`settings_store`** – Owns the settings, tracks unsaved changes, and
//!   loads/saves `/config.json`.
//!
//! - **`admin`** – Applies `key = value` edits coming from the configuration
//!   page or the command line.

pub mod admin;
pub mod settings_store;
