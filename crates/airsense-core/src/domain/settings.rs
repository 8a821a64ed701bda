//! The user-configurable settings of the sensor.
//!
//! [`Settings`] is a plain value: it knows its factory defaults and how to
//! print itself, but not where it is stored.  Field names match the keys of
//! the flash document one to one, so the derived `Serialize` produces the
//! on-flash layout directly.

use std::fmt;

use serde::Serialize;

/// Default MQTT topic the readings are published under.
pub const DEFAULT_MQTT_TOPIC: &str = "PM2_5";

/// Default MQTT broker port, kept as text like the rest of the broker fields.
pub const DEFAULT_MQTT_PORT: &str = "1883";

/// Brightness of the status LED as a percentage.
///
/// Every constructor saturates into `0..=100`, so an out-of-range value read
/// from an old or hand-edited config file can never reach the LED driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct LedIntensity(u8);

impl LedIntensity {
    /// LED switched off.
    pub const MIN: LedIntensity = LedIntensity(0);
    /// Full brightness.
    pub const MAX: LedIntensity = LedIntensity(100);

    /// Creates an intensity from any integer, clamping to `0..=100`.
    ///
    /// ```rust
    /// use airsense_core::LedIntensity;
    ///
    /// assert_eq!(LedIntensity::clamped(-5).get(), 0);
    /// assert_eq!(LedIntensity::clamped(150).get(), 100);
    /// assert_eq!(LedIntensity::clamped(57).get(), 57);
    /// ```
    pub fn clamped(value: i64) -> Self {
        // The clamp guarantees the value fits in a u8.
        Self(value.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    /// Returns the percentage.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for LedIntensity {
    fn from(value: u8) -> Self {
        Self::clamped(i64::from(value))
    }
}

impl From<LedIntensity> for u8 {
    fn from(value: LedIntensity) -> Self {
        value.0
    }
}

impl fmt::Display for LedIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All persisted settings of the device.
///
/// `Settings::default()` is the factory state used on first boot, before any
/// `/config.json` has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Whether the device joins WiFi and reports over MQTT.
    pub use_wifi: bool,
    /// Status LED brightness while it is day.
    pub led_intensity_at_day: LedIntensity,
    /// Status LED brightness while it is night.
    pub led_intensity_at_night: LedIntensity,
    /// Topic the PM2.5 readings are published to.
    pub mqtt_topic: String,
    /// Broker host name or IP address.  Empty means not configured.
    pub mqtt_server: String,
    /// Broker port as entered by the user.  Validated by
    /// [`Settings::mqtt_endpoint`](crate::Settings::mqtt_endpoint).
    pub mqtt_port: String,
    /// Broker user name.  Empty means anonymous.
    pub mqtt_username: String,
    /// Broker password.
    pub mqtt_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_wifi: false,
            led_intensity_at_day: LedIntensity::MIN,
            led_intensity_at_night: LedIntensity::MIN,
            mqtt_topic: DEFAULT_MQTT_TOPIC.to_string(),
            mqtt_server: String::new(),
            mqtt_port: DEFAULT_MQTT_PORT.to_string(),
            mqtt_username: String::new(),
            mqtt_password: String::new(),
        }
    }
}

/// Diagnostic dump for the console, one aligned line per setting.
impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All available settings")?;
        writeln!(f, "{:<24}{}", "Use Wifi:", self.use_wifi)?;
        writeln!(f, "{:<24}{}", "Led Intensity at day:", self.led_intensity_at_day)?;
        writeln!(f, "{:<24}{}", "Led Intensity at night:", self.led_intensity_at_night)?;
        writeln!(f, "{:<24}{}", "MQTT Topic:", self.mqtt_topic)?;
        writeln!(f, "{:<24}{}", "MQTT server:", self.mqtt_server)?;
        writeln!(f, "{:<24}{}", "MQTT port:", self.mqtt_port)?;
        writeln!(f, "{:<24}{}", "MQTT user name:", self.mqtt_username)?;
        write!(f, "{:<24}{}", "MQTT password:", self.mqtt_password)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Factory defaults ──────────────────────────────────────────────────────

    #[test]
    fn test_default_settings_match_factory_values() {
        // Arrange / Act
        let s = Settings::default();

        // Assert
        assert!(!s.use_wifi);
        assert_eq!(s.led_intensity_at_day.get(), 0);
        assert_eq!(s.led_intensity_at_night.get(), 0);
        assert_eq!(s.mqtt_topic, "PM2_5");
        assert_eq!(s.mqtt_server, "");
        assert_eq!(s.mqtt_port, "1883");
        assert_eq!(s.mqtt_username, "");
        assert_eq!(s.mqtt_password, "");
    }

    // ── LedIntensity ──────────────────────────────────────────────────────────

    #[test]
    fn test_led_intensity_clamps_negative_to_zero() {
        assert_eq!(LedIntensity::clamped(-5), LedIntensity::MIN);
        assert_eq!(LedIntensity::clamped(i64::MIN), LedIntensity::MIN);
    }

    #[test]
    fn test_led_intensity_clamps_above_hundred() {
        assert_eq!(LedIntensity::clamped(150), LedIntensity::MAX);
        assert_eq!(LedIntensity::clamped(i64::MAX), LedIntensity::MAX);
    }

    #[test]
    fn test_led_intensity_keeps_in_range_values() {
        assert_eq!(LedIntensity::clamped(57).get(), 57);
        assert_eq!(LedIntensity::clamped(0).get(), 0);
        assert_eq!(LedIntensity::clamped(100).get(), 100);
    }

    #[test]
    fn test_led_intensity_from_u8_clamps() {
        assert_eq!(LedIntensity::from(255u8).get(), 100);
        assert_eq!(u8::from(LedIntensity::from(42u8)), 42);
    }

    // ── Diagnostic dump ───────────────────────────────────────────────────────

    #[test]
    fn test_display_lists_every_setting() {
        // Arrange
        let s = Settings {
            use_wifi: true,
            led_intensity_at_day: LedIntensity::clamped(80),
            led_intensity_at_night: LedIntensity::clamped(5),
            mqtt_topic: "home/pm25".to_string(),
            mqtt_server: "broker.lan".to_string(),
            mqtt_port: "8883".to_string(),
            mqtt_username: "sensor".to_string(),
            mqtt_password: "hunter2".to_string(),
        };

        // Act
        let dump = s.to_string();

        // Assert
        assert!(dump.starts_with("All available settings\n"));
        assert!(dump.contains("Use Wifi:               true"));
        assert!(dump.contains("Led Intensity at day:   80"));
        assert!(dump.contains("Led Intensity at night: 5"));
        assert!(dump.contains("MQTT Topic:             home/pm25"));
        assert!(dump.contains("MQTT server:            broker.lan"));
        assert!(dump.contains("MQTT port:              8883"));
        assert!(dump.contains("MQTT user name:         sensor"));
        assert!(dump.contains("MQTT password:          hunter2"));
        assert_eq!(dump.lines().count(), 9);
    }
}
