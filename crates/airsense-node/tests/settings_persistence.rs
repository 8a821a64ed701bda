//! Integration tests for settings persistence.
//!
//! These tests exercise `SettingsStore` end-to-end through the public API,
//! against both the in-memory flash and a real temp directory, covering the
//! boot-time load, the save after an admin edit, and every failure path.

use std::fs;
use std::path::PathBuf;

use airsense_core::{LedIntensity, Settings};
use airsense_node::application::admin::{apply_setting, SettingKey};
use airsense_node::application::settings_store::{ErrorKind, SettingsStore, CONFIG_PATH};
use airsense_node::infrastructure::storage::{DirectoryFlash, MemoryFlash};
use uuid::Uuid;

fn customised(store: &mut SettingsStore<MemoryFlash>) {
    store.set_use_wifi(true);
    store.set_led_intensity_at_day(LedIntensity::clamped(90));
    store.set_led_intensity_at_night(LedIntensity::clamped(4));
    store.set_mqtt_topic("home/air");
    store.set_mqtt_server("10.1.1.1");
    store.set_mqtt_port("1884");
    store.set_mqtt_username("node");
    store.set_mqtt_password("pw");
}

// ── Round trip ────────────────────────────────────────────────────────────────

#[test]
fn test_save_then_load_into_fresh_store_restores_values() {
    // Arrange
    let mut first = SettingsStore::new(MemoryFlash::new());
    customised(&mut first);
    let expected = first.settings().clone();

    // Act
    first.save().expect("save must succeed");
    let mut second = SettingsStore::new(first.into_filesystem());
    second.load().expect("load must succeed");

    // Assert
    assert_eq!(second.settings(), &expected);
    assert!(!second.is_dirty());
    assert_eq!(second.last_error(), None);
}

#[test]
fn test_save_then_load_on_same_store_is_stable() {
    let mut store = SettingsStore::new(MemoryFlash::new());
    customised(&mut store);
    let expected = store.settings().clone();

    store.save().unwrap();
    store.load().unwrap();

    assert_eq!(store.settings(), &expected);
}

#[test]
fn test_round_trip_through_directory_flash() {
    // Arrange: root does not exist yet, so the first save formats it
    let root: PathBuf = std::env::temp_dir().join(format!("airsense_it_{}", Uuid::new_v4()));
    let mut store = SettingsStore::new(DirectoryFlash::new(&root));
    assert_eq!(store.filesystem().root(), root.as_path());
    store.set_mqtt_server("broker.example");
    store.set_led_intensity_at_night(LedIntensity::clamped(57));

    // Act
    store.save().expect("save into fresh directory must succeed");
    let mut reloaded = SettingsStore::new(DirectoryFlash::new(&root));
    reloaded.load().expect("load must succeed");

    // Assert
    assert_eq!(reloaded.mqtt_server(), "broker.example");
    assert_eq!(reloaded.led_intensity_at_night().get(), 57);
    assert!(root.join("config.json").is_file());

    // Cleanup
    fs::remove_dir_all(&root).ok();
}

// ── Boot-time load ────────────────────────────────────────────────────────────

#[test]
fn test_first_boot_without_config_keeps_factory_defaults() {
    let mut store = SettingsStore::new(MemoryFlash::new());

    assert!(store.load().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FileNotFound));
    assert_eq!(store.settings(), &Settings::default());
}

#[test]
fn test_partial_document_updates_only_listed_fields() {
    // Arrange
    let flash = MemoryFlash::new();
    let mut store = SettingsStore::new(flash.clone());
    store.set_mqtt_username("kept");
    flash.put_file(CONFIG_PATH, br#"{"mqtt_topic":"partial","led_intensity_at_day":150}"#);

    // Act
    store.load().unwrap();

    // Assert
    assert_eq!(store.mqtt_topic(), "partial");
    assert_eq!(store.led_intensity_at_day().get(), 100);
    assert_eq!(store.mqtt_username(), "kept");
    assert_eq!(store.mqtt_port(), "1883");
}

#[test]
fn test_malformed_document_changes_nothing() {
    // Arrange
    let flash = MemoryFlash::new();
    let mut store = SettingsStore::new(flash.clone());
    customised(&mut store);
    store.save().unwrap();
    let before = store.settings().clone();
    flash.put_file(CONFIG_PATH, b"\x00\x01garbage");

    // Act
    let result = store.load();

    // Assert
    assert!(result.is_err());
    assert_eq!(store.last_error(), Some(ErrorKind::JsonParse));
    assert_eq!(store.settings(), &before);
}

#[test]
fn test_mount_failure_on_load_keeps_state() {
    let flash = MemoryFlash::new().with_file(CONFIG_PATH, br#"{"use_wifi":true}"#);
    flash.set_fail_mount(true);
    let mut store = SettingsStore::new(flash.clone());

    assert!(store.load().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FilesystemMount));
    assert!(!store.use_wifi());
    assert_eq!(flash.format_calls(), 0, "load must never format");
}

#[test]
fn test_unreadable_file_is_file_open_error() {
    let flash = MemoryFlash::new().with_file(CONFIG_PATH, b"{}");
    flash.set_fail_open_read(true);
    let mut store = SettingsStore::new(flash);

    assert!(store.load().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FileOpen));
}

#[test]
fn test_read_failure_after_open_is_file_open_error() {
    // Arrange
    let flash = MemoryFlash::new().with_file(CONFIG_PATH, br#"{"mqtt_topic":"stored"}"#);
    flash.set_fail_read(true);
    let mut store = SettingsStore::new(flash);
    store.set_mqtt_server("unsaved");

    // Act
    let result = store.load();

    // Assert
    assert!(result.is_err());
    assert_eq!(store.last_error(), Some(ErrorKind::FileOpen));
    assert_eq!(store.mqtt_topic(), "PM2_5");
    assert_eq!(store.mqtt_server(), "unsaved");
    assert!(store.is_dirty());
}

// ── Save ──────────────────────────────────────────────────────────────────────

#[test]
fn test_save_formats_unformatted_flash_once() {
    // Arrange
    let flash = MemoryFlash::unformatted();
    let mut store = SettingsStore::new(flash.clone());
    store.set_use_wifi(true);

    // Act
    store.save().expect("save must succeed after format");

    // Assert
    assert_eq!(flash.format_calls(), 1);
    assert_eq!(flash.mount_calls(), 2);
    assert!(flash.file(CONFIG_PATH).is_some());
    assert!(!store.is_dirty());
}

#[test]
fn test_save_gives_up_when_mount_keeps_failing() {
    let flash = MemoryFlash::new();
    flash.set_fail_mount(true);
    let mut store = SettingsStore::new(flash.clone());
    store.set_use_wifi(true);

    assert!(store.save().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FilesystemMount));
    assert_eq!(flash.format_calls(), 1);
    assert_eq!(flash.mount_calls(), 2);
    assert!(store.is_dirty());
}

#[test]
fn test_save_open_failure_keeps_dirty() {
    let flash = MemoryFlash::new();
    flash.set_fail_open_write(true);
    let mut store = SettingsStore::new(flash.clone());
    store.set_mqtt_topic("x");

    assert!(store.save().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FileWrite));
    assert!(store.is_dirty());
    assert!(flash.file(CONFIG_PATH).is_none());
}

#[test]
fn test_save_write_failure_is_file_write_error() {
    let flash = MemoryFlash::new();
    flash.set_fail_write(true);
    let mut store = SettingsStore::new(flash);
    store.set_mqtt_topic("x");

    assert!(store.save().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FileWrite));
}

#[test]
fn test_save_close_failure_is_file_write_error() {
    let flash = MemoryFlash::new();
    flash.set_fail_close(true);
    let mut store = SettingsStore::new(flash);
    store.set_mqtt_topic("x");

    assert!(store.save().is_err());

    assert_eq!(store.last_error(), Some(ErrorKind::FileWrite));
    assert!(store.is_dirty());
}

#[test]
fn test_successful_save_clears_error_from_failed_load() {
    let mut store = SettingsStore::new(MemoryFlash::new());
    let _ = store.load();
    assert_eq!(store.last_error(), Some(ErrorKind::FileNotFound));

    store.save().unwrap();

    assert_eq!(store.last_error(), None);
}

// ── Admin edit flow ───────────────────────────────────────────────────────────

#[test]
fn test_admin_edit_then_save_persists() {
    // Arrange
    let flash = MemoryFlash::new();
    let mut store = SettingsStore::new(flash.clone());

    // Act
    let changed = apply_setting(&mut store, SettingKey::MqttServer, "mqtt.lan").unwrap();
    assert!(changed && store.is_dirty());
    store.save().unwrap();

    // Assert
    let mut reloaded = SettingsStore::new(flash);
    reloaded.load().unwrap();
    assert_eq!(reloaded.mqtt_server(), "mqtt.lan");
}

#[test]
fn test_idempotent_edit_keeps_store_clean_after_load() {
    let flash = MemoryFlash::new().with_file(CONFIG_PATH, br#"{"mqtt_port":"1883"}"#);
    let mut store = SettingsStore::new(flash);
    store.load().unwrap();

    store.set_mqtt_port("1883");

    assert!(!store.is_dirty());
}
