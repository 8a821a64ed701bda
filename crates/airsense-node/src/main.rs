//! AirSense node command-line entry point.
//!
//! Drives the settings store against a host directory that stands in for
//! the sensor's flash filesystem.  This is the admin surface for the
//! settings: inspect them, edit single values, or reset to factory state.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_node_config()        -- airsense.toml (flash dir, log level)
//!  └─ SettingsStore::new(DirectoryFlash)
//!  └─ store.load()              -- missing/broken config: keep defaults
//!  └─ subcommand
//!       ├─ show / get            -- read only
//!       ├─ set                   -- apply_setting(), save if dirty
//!       ├─ reset                 -- factory_reset(), save
//!       └─ check-mqtt            -- Settings::mqtt_endpoint()
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airsense_node::application::admin::{apply_setting, read_setting, SettingKey};
use airsense_node::application::settings_store::SettingsStore;
use airsense_node::infrastructure::node_config::{
    load_node_config, NodeConfig, DEFAULT_NODE_CONFIG_FILE,
};
use airsense_node::infrastructure::storage::DirectoryFlash;

/// Inspect and edit the settings of an AirSense PM2.5 sensor.
#[derive(Debug, Parser)]
#[command(name = "airsense-node", version, about)]
struct Cli {
    /// Runtime configuration file.
    #[arg(long, env = "AIRSENSE_CONFIG", default_value = DEFAULT_NODE_CONFIG_FILE)]
    config: PathBuf,

    /// Directory standing in for the flash filesystem (overrides the config file).
    #[arg(long, env = "AIRSENSE_FLASH_DIR")]
    flash_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every setting.
    Show,
    /// Print a single setting.
    Get { key: SettingKey },
    /// Change a single setting and save it.
    Set { key: SettingKey, value: String },
    /// Restore factory defaults and save them.
    Reset,
    /// Validate the MQTT broker settings.
    CheckMqtt,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log level comes from the config file, so read it before logging
    // is up and report any problem afterwards.
    let loaded = load_node_config(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let node_config = loaded.unwrap_or_else(|e| {
        warn!("ignoring {}: {e}", cli.config.display());
        NodeConfig::default()
    });
    let flash_dir = cli.flash_dir.unwrap_or(node_config.flash_dir);
    info!("using flash directory {}", flash_dir.display());

    let mut store = SettingsStore::new(DirectoryFlash::new(flash_dir));
    // Failures are logged by the store; carry on with what is in memory.
    let _ = store.load();

    match cli.command {
        Command::Show => println!("{}", store.dump()),
        Command::Get { key } => println!("{}", read_setting(&store, key)),
        Command::Set { key, value } => {
            if apply_setting(&mut store, key, &value)? {
                store.save().with_context(|| format!("saving {key}"))?;
                info!("{key} updated");
            } else {
                info!("{key} unchanged");
            }
        }
        Command::Reset => {
            store.factory_reset();
            store.save().context("saving factory defaults")?;
            println!("{}", store.dump());
        }
        Command::CheckMqtt => match store.settings().mqtt_endpoint() {
            Ok(endpoint) => {
                if !store.use_wifi() {
                    warn!("WiFi is disabled; the device will not report over MQTT");
                }
                println!("{endpoint}");
            }
            Err(e) => anyhow::bail!("MQTT settings are not usable: {e}"),
        },
    }

    Ok(())
}
