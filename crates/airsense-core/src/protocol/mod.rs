//! On-flash representation of the settings.
//!
//! The settings live in a single flat JSON object, `/config.json`.  The
//! [`document`] module converts between that object and [`crate::Settings`].

pub mod document;
