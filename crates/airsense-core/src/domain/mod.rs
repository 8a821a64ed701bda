//! Domain entities for the sensor settings.
//!
//! Pure value types with no infrastructure dependencies.  The settings store
//! in `airsense-node` owns a [`settings::Settings`] and decides when it is
//! persisted; the types here only describe what a valid configuration is.

/// The persisted settings value and its factory defaults.
pub mod settings;

/// Validation of the MQTT broker fields at the point of use.
pub mod mqtt;
