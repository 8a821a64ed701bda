//! Codec for the `/config.json` settings document.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "use_wifi": false,
//!   "led_intensity_at_day": 0,
//!   "led_intensity_at_night": 0,
//!   "mqtt_topic": "PM2_5",
//!   "mqtt_server": "",
//!   "mqtt_port": "1883",
//!   "mqtt_username": "",
//!   "mqtt_password": ""
//! }
//! ```
//!
//! [`encode`] always writes all eight keys.  [`decode`] is deliberately
//! lenient because files on deployed devices were written by older firmware
//! and by the web configuration page:
//!
//! - Any key may be missing; the field then keeps its in-memory value.
//! - Unknown keys are ignored.
//! - `use_wifi` may be a bool or the string `"true"` / `"false"`.
//! - Intensities may be integers, floats (truncated) or numeric strings, and
//!   are clamped to `0..=100`.
//! - String fields accept numbers and bools, which are stringified, so
//!   `"mqtt_port": 1883` loads as `"1883"`.
//!
//! A recognised key whose value cannot be coerced is skipped and recorded in
//! [`SettingsPatch::skipped`]; it does not fail the whole document.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::domain::settings::{LedIntensity, Settings};

pub const KEY_USE_WIFI: &str = "use_wifi";
pub const KEY_LED_INTENSITY_AT_DAY: &str = "led_intensity_at_day";
pub const KEY_LED_INTENSITY_AT_NIGHT: &str = "led_intensity_at_night";
pub const KEY_MQTT_TOPIC: &str = "mqtt_topic";
pub const KEY_MQTT_SERVER: &str = "mqtt_server";
pub const KEY_MQTT_PORT: &str = "mqtt_port";
pub const KEY_MQTT_USERNAME: &str = "mqtt_username";
pub const KEY_MQTT_PASSWORD: &str = "mqtt_password";

/// Every key the document understands, in the order [`encode`] writes them.
pub const KEYS: [&str; 8] = [
    KEY_USE_WIFI,
    KEY_LED_INTENSITY_AT_DAY,
    KEY_LED_INTENSITY_AT_NIGHT,
    KEY_MQTT_TOPIC,
    KEY_MQTT_SERVER,
    KEY_MQTT_PORT,
    KEY_MQTT_USERNAME,
    KEY_MQTT_PASSWORD,
];

const REDACTED: &str = "********";

/// Error type for settings document encoding and decoding.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The bytes are not valid JSON.
    #[error("malformed settings document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The bytes are valid JSON but the top-level value is not an object.
    #[error("settings document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// The fields present in a decoded document.
///
/// `None` means the key was absent (or skipped), and the matching field of
/// the target [`Settings`] is left alone by [`SettingsPatch::apply_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub use_wifi: Option<bool>,
    pub led_intensity_at_day: Option<LedIntensity>,
    pub led_intensity_at_night: Option<LedIntensity>,
    pub mqtt_topic: Option<String>,
    pub mqtt_server: Option<String>,
    pub mqtt_port: Option<String>,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    skipped: Vec<&'static str>,
}

impl SettingsPatch {
    /// Keys that were present but held a value of an unusable type.
    pub fn skipped(&self) -> &[&'static str] {
        &self.skipped
    }

    /// Returns `true` if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.use_wifi.is_none()
            && self.led_intensity_at_day.is_none()
            && self.led_intensity_at_night.is_none()
            && self.mqtt_topic.is_none()
            && self.mqtt_server.is_none()
            && self.mqtt_port.is_none()
            && self.mqtt_username.is_none()
            && self.mqtt_password.is_none()
    }

    /// Assigns every present field to `target`.
    pub fn apply_to(self, target: &mut Settings) {
        if let Some(v) = self.use_wifi {
            target.use_wifi = v;
        }
        if let Some(v) = self.led_intensity_at_day {
            target.led_intensity_at_day = v;
        }
        if let Some(v) = self.led_intensity_at_night {
            target.led_intensity_at_night = v;
        }
        if let Some(v) = self.mqtt_topic {
            target.mqtt_topic = v;
        }
        if let Some(v) = self.mqtt_server {
            target.mqtt_server = v;
        }
        if let Some(v) = self.mqtt_port {
            target.mqtt_port = v;
        }
        if let Some(v) = self.mqtt_username {
            target.mqtt_username = v;
        }
        if let Some(v) = self.mqtt_password {
            target.mqtt_password = v;
        }
    }
}

/// Serializes `settings` into the compact form written to flash.
///
/// # Errors
///
/// Returns [`DocumentError::Serialize`] if serialization fails.
pub fn encode(settings: &Settings) -> Result<Vec<u8>, DocumentError> {
    serde_json::to_vec(settings).map_err(DocumentError::Serialize)
}

/// Pretty-printed document with the password masked, for debug logs.
///
/// # Errors
///
/// Returns [`DocumentError::Serialize`] if serialization fails.
pub fn redacted_pretty(settings: &Settings) -> Result<String, DocumentError> {
    let mut value = serde_json::to_value(settings).map_err(DocumentError::Serialize)?;
    if let Some(password) = value.get_mut(KEY_MQTT_PASSWORD) {
        if password.as_str().is_some_and(|p| !p.is_empty()) {
            *password = Value::String(REDACTED.to_string());
        }
    }
    serde_json::to_string_pretty(&value).map_err(DocumentError::Serialize)
}

/// Parses a settings document.
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] if `bytes` is not JSON, and
/// [`DocumentError::NotAnObject`] if the top-level value is not an object.
pub fn decode(bytes: &[u8]) -> Result<SettingsPatch, DocumentError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(DocumentError::NotAnObject {
                found: json_type_name(&other),
            })
        }
    };

    let mut patch = SettingsPatch::default();
    patch.use_wifi = field(&map, KEY_USE_WIFI, as_bool, &mut patch.skipped);
    patch.led_intensity_at_day =
        field(&map, KEY_LED_INTENSITY_AT_DAY, as_intensity, &mut patch.skipped);
    patch.led_intensity_at_night =
        field(&map, KEY_LED_INTENSITY_AT_NIGHT, as_intensity, &mut patch.skipped);
    patch.mqtt_topic = field(&map, KEY_MQTT_TOPIC, as_text, &mut patch.skipped);
    patch.mqtt_server = field(&map, KEY_MQTT_SERVER, as_text, &mut patch.skipped);
    patch.mqtt_port = field(&map, KEY_MQTT_PORT, as_text, &mut patch.skipped);
    patch.mqtt_username = field(&map, KEY_MQTT_USERNAME, as_text, &mut patch.skipped);
    patch.mqtt_password = field(&map, KEY_MQTT_PASSWORD, as_text, &mut patch.skipped);
    Ok(patch)
}

/// Looks up `key` and coerces it, recording the key as skipped on failure.
fn field<T>(
    map: &Map<String, Value>,
    key: &'static str,
    coerce: fn(&Value) -> Option<T>,
    skipped: &mut Vec<&'static str>,
) -> Option<T> {
    let value = map.get(key)?;
    let coerced = coerce(value);
    if coerced.is_none() {
        warn!(
            "settings document: ignoring {key}, unusable {} value",
            json_type_name(value)
        );
        skipped.push(key);
    }
    coerced
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_intensity(value: &Value) -> Option<LedIntensity> {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })?
        }
        _ => return None,
    };
    Some(LedIntensity::clamped(raw))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
