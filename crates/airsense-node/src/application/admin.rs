//! EditSettings use case: text-based reads and writes of single settings.
//!
//! The configuration page and the CLI both hand over settings as
//! `key = value` text.  This module maps the document key names onto the
//! typed setters of [`SettingsStore`], so the dirty tracking stays in one
//! place.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use airsense_core::{protocol::document as doc, LedIntensity};
use thiserror::Error;

use super::settings_store::{FlashFilesystem, SettingsStore};

/// Error type for admin edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("unknown setting {0:?}")]
    UnknownKey(String),
    #[error("invalid value {value:?} for {key}: expected true or false")]
    InvalidBool { key: SettingKey, value: String },
    #[error("invalid value {value:?} for {key}: expected an integer")]
    InvalidInteger { key: SettingKey, value: String },
}

/// One editable setting, named by its key in the flash document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    UseWifi,
    LedIntensityAtDay,
    LedIntensityAtNight,
    MqttTopic,
    MqttServer,
    MqttPort,
    MqttUsername,
    MqttPassword,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::UseWifi,
        SettingKey::LedIntensityAtDay,
        SettingKey::LedIntensityAtNight,
        SettingKey::MqttTopic,
        SettingKey::MqttServer,
        SettingKey::MqttPort,
        SettingKey::MqttUsername,
        SettingKey::MqttPassword,
    ];

    /// The key name used in `/config.json`.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::UseWifi => doc::KEY_USE_WIFI,
            SettingKey::LedIntensityAtDay => doc::KEY_LED_INTENSITY_AT_DAY,
            SettingKey::LedIntensityAtNight => doc::KEY_LED_INTENSITY_AT_NIGHT,
            SettingKey::MqttTopic => doc::KEY_MQTT_TOPIC,
            SettingKey::MqttServer => doc::KEY_MQTT_SERVER,
            SettingKey::MqttPort => doc::KEY_MQTT_PORT,
            SettingKey::MqttUsername => doc::KEY_MQTT_USERNAME,
            SettingKey::MqttPassword => doc::KEY_MQTT_PASSWORD,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the document key names; `-` may be used in place of `_`.
impl FromStr for SettingKey {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| AdminError::UnknownKey(s.to_string()))
    }
}

/// Parses `value` for `key` and applies it through the store's setter.
///
/// Returns whether the setting changed (and so marked the store dirty).
///
/// # Errors
///
/// Returns [`AdminError::InvalidBool`] or [`AdminError::InvalidInteger`] when
/// the text cannot be parsed for the key's type.  The store is not modified.
pub fn apply_setting<F: FlashFilesystem>(
    store: &mut SettingsStore<F>,
    key: SettingKey,
    value: &str,
) -> Result<bool, AdminError> {
    let changed = match key {
        SettingKey::UseWifi => store.set_use_wifi(parse_bool(key, value)?),
        SettingKey::LedIntensityAtDay => {
            store.set_led_intensity_at_day(parse_intensity(key, value)?)
        }
        SettingKey::LedIntensityAtNight => {
            store.set_led_intensity_at_night(parse_intensity(key, value)?)
        }
        SettingKey::MqttTopic => store.set_mqtt_topic(value),
        SettingKey::MqttServer => store.set_mqtt_server(value),
        SettingKey::MqttPort => store.set_mqtt_port(value),
        SettingKey::MqttUsername => store.set_mqtt_username(value),
        SettingKey::MqttPassword => store.set_mqtt_password(value),
    };
    Ok(changed)
}

/// Returns the current value of `key` as text.
pub fn read_setting<F>(store: &SettingsStore<F>, key: SettingKey) -> String {
    match key {
        SettingKey::UseWifi => store.use_wifi().to_string(),
        SettingKey::LedIntensityAtDay => store.led_intensity_at_day().to_string(),
        SettingKey::LedIntensityAtNight => store.led_intensity_at_night().to_string(),
        SettingKey::MqttTopic => store.mqtt_topic().to_string(),
        SettingKey::MqttServer => store.mqtt_server().to_string(),
        SettingKey::MqttPort => store.mqtt_port().to_string(),
        SettingKey::MqttUsername => store.mqtt_username().to_string(),
        SettingKey::MqttPassword => store.mqtt_password().to_string(),
    }
}

fn parse_bool(key: SettingKey, value: &str) -> Result<bool, AdminError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(AdminError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

/// Integers outside the `i64` range saturate, so they clamp like any other
/// out-of-range intensity.
fn parse_intensity(key: SettingKey, value: &str) -> Result<LedIntensity, AdminError> {
    let n = match value.trim().parse::<i64>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => i64::MIN,
        Err(_) => {
            return Err(AdminError::InvalidInteger {
                key,
                value: value.to_string(),
            })
        }
    };
    Ok(LedIntensity::clamped(n))
}
