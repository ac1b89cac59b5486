//! # Joystick Relay
//!
//! Stream a dual-joystick controller with triggers and keypad to remote
//! receivers over UDP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use joystick_relay::config::Config;
use joystick_relay::relay::destination::resolve_all;
use joystick_relay::relay::ping::{ping, MAX_PING_ROUNDS};
use joystick_relay::relay::{Destination, Relay};

/// Command line options
#[derive(Parser, Debug)]
#[command(name = "joystick-relay", version, about = "Relay joystick, trigger and keypad state over UDP")]
struct Cli {
    /// TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Destination host[:port]; repeat for several receivers. Replaces the configured list
    #[arg(short = 'H', long = "host")]
    hosts: Vec<Destination>,

    /// Ping every destination this many rounds before starting
    #[arg(
        short = 'P',
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_PING_ROUNDS))
    )]
    ping: u32,

    /// Dump controller state to stdout instead of relaying
    #[arg(short = 'D', long)]
    diags: bool,

    /// Raw ADC count mapped to sample 0
    #[arg(long)]
    max_val: Option<i32>,
}

impl Cli {
    /// Load the configuration file (or defaults) and apply overrides.
    fn into_config(self) -> Result<(Config, u32, bool)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if !self.hosts.is_empty() {
            config.relay.destinations = self.hosts;
        }
        if let Some(max_val) = self.max_val {
            config.adc.max_val = max_val;
        }
        config.validate()?;

        Ok((config, self.ping, self.diags))
    }
}

/// Main entry point for Joystick Relay
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging (stderr, so the diagnostic dump owns stdout)
///    - Load configuration and apply command line overrides
///    - Resolve destinations and bind the UDP socket
///
/// 2. **Ping** (with `--ping N`)
///    - Probe every destination N rounds and log the round-trip times
///
/// 3. **Diagnostics** (with `--diags`)
///    - Print controller state every 100 ms until interrupted
///
/// 4. **Relay**
///    - Run the sampling loop on a blocking-pool thread
///    - Wait for Ctrl+C or a fatal hardware error
///
/// # Errors
///
/// Returns error if:
/// - Configuration is invalid or a destination does not resolve
/// - The socket cannot be bound
/// - The controller hardware cannot be opened or fails while sampling
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Joystick Relay v{} starting...", env!("CARGO_PKG_VERSION"));

    let (config, ping_rounds, diags) = Cli::parse().into_config()?;

    if config.relay.destinations.is_empty() && !diags {
        warn!("No destinations configured; frames will not be sent anywhere");
    }
    for dest in &config.relay.destinations {
        info!("Destination: {}", dest);
    }

    let destinations = resolve_all(&config.relay.destinations).await?;
    let socket = UdpSocket::bind(&config.relay.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.relay.bind_address))?;
    let relay = Relay::new(socket, destinations);

    if ping_rounds > 0 {
        let reports = ping(&relay, ping_rounds, config.ping.timeout()).await;
        let replies = reports.iter().filter(|r| r.outcome.is_reply()).count();
        info!("Ping finished: {}/{} replies", replies, reports.len());
    }

    run_controller(&config, relay, diags).await
}

#[cfg(feature = "rpi")]
async fn run_controller(config: &Config, relay: Relay<UdpSocket>, diags: bool) -> Result<()> {
    use joystick_relay::hardware::rpi::{Ads1115, RpiGpio};
    use joystick_relay::hardware::ControllerDevice;
    use joystick_relay::sampler::{LoopMode, Sampler};
    use tracing::error;

    let adc = Ads1115::open(config.adc.i2c_bus, config.adc.address)?;
    let gpio = RpiGpio::open()?;
    let device = ControllerDevice::new(adc, gpio, config.adc.max_val)?;

    let sampler = Sampler::new(device, relay)
        .with_centers(config.sampling.centers)
        .with_cycle_interval(config.sampling.cycle_interval());

    let mode = if diags {
        info!("Diagnostic mode, press Ctrl+C to exit");
        LoopMode::Diagnostics
    } else {
        info!("Press Ctrl+C to exit");
        LoopMode::Relay
    };
    let mut task = sampler.spawn(mode);

    tokio::select! {
        result = task.finished() => {
            if let Err(e) = result {
                error!("Sampling stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            task.stop().await?;
        }
    }

    Ok(())
}

#[cfg(not(feature = "rpi"))]
async fn run_controller(_config: &Config, _relay: Relay<UdpSocket>, _diags: bool) -> Result<()> {
    Err(joystick_relay::error::RelayError::Hardware(
        "built without a controller backend; rebuild with `--features rpi`".to_string(),
    )
    .into())
}
