//! # Joydrive
//!
//! Drive a differential-drive robot from a gamepad stick.
//!
//! Reads the stick over evdev, mixes it into left/right duty cycles, and sends
//! them to two VESC motor controllers over serial.
//!
//! # Usage
//!
//! ```bash
//! joydrive [config.toml]
//! ```
//!
//! Without an argument `config/default.toml` is loaded when present, otherwise
//! built-in defaults are used.
//!
//! # Controls (default bindings)
//!
//! | Button | Action |
//! |--------|--------|
//! | 1 | Emergency stop |
//! | 0 | Release emergency stop |
//! | 7 | Quit |
//!
//! Ctrl+C runs the same shutdown path as quit: the motors receive a final zero
//! command before the serial ports are released.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use joydrive::config::Config;
use joydrive::controller::gamepad::Gamepad;
use joydrive::controller::InputDevice;
use joydrive::motor::MotorLinkAdapter;
use joydrive::session::{LogPresenter, Session};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Joydrive v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let gamepad = match Gamepad::open(&config.input.device_path) {
        Ok(gamepad) => gamepad,
        Err(e) => {
            error!("No joystick available: {}", e);
            error!("Connect a controller and try again");
            return Ok(());
        }
    };

    info!("Joystick: {}", gamepad.device_name());
    info!(
        "Axes: {}, buttons: {}",
        gamepad.axis_count(),
        gamepad.button_count()
    );

    let link = MotorLinkAdapter::connect(&config.link, &config.telemetry);
    info!("Motor link: {}", link.state());

    let session = Session::new(gamepad, &config, link);
    let mut presenter = LogPresenter;
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let summary = session.run(&mut presenter, interrupt).await;
    info!("Joydrive stopped ({})", summary.reason);

    Ok(())
}

fn load_config() -> Result<Config> {
    if let Some(path) = std::env::args().nth(1) {
        info!("Loading configuration from {}", path);
        return Config::load(&path).with_context(|| format!("Failed to load {}", path));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
        return Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH));
    }

    info!("No configuration file, using defaults");
    Ok(Config::default())
}
