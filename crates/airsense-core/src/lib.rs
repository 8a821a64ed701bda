//! # airsense-core
//!
//! Shared library for the AirSense PM2.5 sensor containing the settings
//! domain types and the codec for the settings document stored on flash.
//!
//! It has no dependencies on filesystems, network sockets, or the device
//! firmware loop, so everything here can be unit-tested on the host.
//!
//! # Overview
//!
//! The sensor keeps a small set of user-configurable values: whether to use
//! WiFi, the status LED brightness by day and by night, and the MQTT broker
//! the readings are published to.  These values live in `/config.json` on
//! the device's flash filesystem and are reloaded at boot.
//!
//! - **`domain`** – The [`Settings`] value with its factory defaults, the
//!   clamped [`LedIntensity`] type, and [`MqttEndpoint`] validation for the
//!   string-typed broker fields.
//!
//! - **`protocol`** – How [`Settings`] is written to and read from the flash
//!   document.  Decoding yields a [`SettingsPatch`] so that keys missing from
//!   an older file leave the current values untouched.

pub mod domain;
pub mod protocol;

pub use domain::mqtt::{Credentials, EndpointError, MqttEndpoint};
pub use domain::settings::{LedIntensity, Settings};
pub use protocol::document::{decode, encode, redacted_pretty, DocumentError, SettingsPatch};
