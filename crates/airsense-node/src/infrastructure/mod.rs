//! Infrastructure layer for the sensor node.
//!
//! Contains the adapters behind the application traits: flash filesystem
//! implementations and the node's own runtime configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `airsense_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.

pub mod node_config;
pub mod storage;
