//! airsense-node library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

/// Application layer: the settings store and admin edits.
pub mod application;

/// Infrastructure layer: flash filesystem adapters and runtime config.
pub mod infrastructure;
