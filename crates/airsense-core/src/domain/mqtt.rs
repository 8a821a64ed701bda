//! MQTT broker endpoint validation.
//!
//! The broker fields are stored as free text so the flash document stays
//! compatible with what the configuration UI writes (the port in particular is
//! a string on the wire).  They are only turned into typed values here, when
//! the MQTT client actually needs to connect, and a bad value surfaces as an
//! [`EndpointError`] instead of a silent connection failure.

use std::fmt;

use thiserror::Error;

use super::settings::Settings;

/// Why the stored broker settings cannot be used to connect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// `mqtt_server` is empty.
    #[error("no MQTT server configured")]
    MissingServer,

    /// `mqtt_port` is not a decimal number in `1..=65535`.
    #[error("invalid MQTT port {0:?}: expected a number between 1 and 65535")]
    InvalidPort(String),

    /// `mqtt_topic` is empty.
    #[error("no MQTT topic configured")]
    MissingTopic,
}

/// User name and password for the broker.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// A validated broker address ready to hand to an MQTT client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttEndpoint {
    pub host: String,
    pub port: u16,
    pub topic: String,
    /// `None` when no user name is configured (anonymous login).
    pub credentials: Option<Credentials>,
}

impl fmt::Display for MqttEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.credentials {
            Some(c) => write!(
                f,
                "mqtt://{}@{}:{}/{}",
                c.username, self.host, self.port, self.topic
            ),
            None => write!(f, "mqtt://{}:{}/{}", self.host, self.port, self.topic),
        }
    }
}

/// Parses a textual port.  Surrounding whitespace is ignored; zero is rejected.
pub fn parse_port(text: &str) -> Result<u16, EndpointError> {
    match text.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(EndpointError::InvalidPort(text.to_string())),
    }
}

impl Settings {
    /// Whether the device should try to report over MQTT at all.
    pub fn mqtt_configured(&self) -> bool {
        self.use_wifi && !self.mqtt_server.trim().is_empty()
    }

    /// Validates the broker fields and returns a typed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::MissingServer`] when no server is set,
    /// [`EndpointError::InvalidPort`] when the port text is not a usable TCP
    /// port, and [`EndpointError::MissingTopic`] when the topic is empty.
    pub fn mqtt_endpoint(&self) -> Result<MqttEndpoint, EndpointError> {
        let host = self.mqtt_server.trim();
        if host.is_empty() {
            return Err(EndpointError::MissingServer);
        }
        let port = parse_port(&self.mqtt_port)?;
        if self.mqtt_topic.is_empty() {
            return Err(EndpointError::MissingTopic);
        }

        let credentials = (!self.mqtt_username.is_empty()).then(|| Credentials {
            username: self.mqtt_username.clone(),
            password: self.mqtt_password.clone(),
        });

        Ok(MqttEndpoint {
            host: host.to_string(),
            port,
            topic: self.mqtt_topic.clone(),
            credentials,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
