// src/main.rs

//! Polls MPU-9250 IMUs sharing one I2C address behind a TCA9548A.
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`); sensor
//! lines go to stdout.

use anyhow::{bail, Context, Result};
use embedded_hal::i2c::I2c;
use clap::{Args, Parser, Subcommand};
use linux_embedded_hal::I2cdev;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tca_imu_mux::{
    config::MuxConfig,
    driver::{
        mpu9250::registers::{ACCEPTED_IDS, ADDRESSES},
        probe_who_am_i, Mpu9250Factory,
    },
    poll::{CancellationToken, ConsoleSink, PollLoop, PollStats},
    Channel, ChannelSelector, HalBus, SessionRegistry, StdTimer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type LinuxSelector = ChannelSelector<HalBus<I2cdev>, StdTimer>;

#[derive(Debug, Parser)]
#[command(name = "tca-imu-mux", version, about)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize every configured sensor and poll until Ctrl-C (default)
    Run,
    /// Probe WHO_AM_I at 0x68 and 0x69 on all eight channels, then list
    /// every address that answers on each channel
    Scan,
}

/// Flags override the config file and the environment.
#[derive(Debug, Args)]
struct Overrides {
    /// TOML configuration file [default: tca-imu-mux.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// I2C bus device, e.g. /dev/i2c-1
    #[arg(long, global = true)]
    bus: Option<PathBuf>,

    /// Multiplexer address (decimal or 0x-prefixed hex)
    #[arg(long, global = true, value_parser = parse_address)]
    mux_address: Option<u8>,

    /// Shared sensor address (decimal or 0x-prefixed hex)
    #[arg(long, global = true, value_parser = parse_address)]
    device_address: Option<u8>,

    /// Comma-separated channel list, e.g. 2,3,4
    #[arg(long, global = true, value_delimiter = ',')]
    channels: Option<Vec<u8>>,

    /// Wait after each channel select, in milliseconds
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// Poll period in milliseconds
    #[arg(long, global = true)]
    period_ms: Option<u64>,

    /// Stop after this many read cycles
    #[arg(long, global = true)]
    cycles: Option<u64>,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid I2C address '{}': {}", s, e))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match load_config(&cli.overrides) {
        Ok(config) => match cli.command.unwrap_or(Command::Run) {
            Command::Run => run(config, cli.overrides.cycles).await,
            Command::Scan => scan(config).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(overrides: &Overrides) -> Result<MuxConfig> {
    if let Some(path) = &overrides.config {
        if !path.exists() {
            bail!("configuration file {} not found", path.display());
        }
    }
    let mut config =
        MuxConfig::extract(overrides.config.as_deref()).context("failed to load configuration")?;

    if let Some(bus) = &overrides.bus {
        config.bus = bus.clone();
    }
    if let Some(address) = overrides.mux_address {
        config.mux_address = address;
    }
    if let Some(address) = overrides.device_address {
        config.sensor.address = address;
    }
    if let Some(channels) = &overrides.channels {
        config.channels = channels.clone();
    }
    if let Some(ms) = overrides.settle_ms {
        config.settle_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.period_ms {
        config.poll_period = Duration::from_millis(ms);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Opens the bus and checks the multiplexer acknowledges.
fn open_selector(config: &MuxConfig) -> Result<LinuxSelector> {
    let i2c = I2cdev::new(&config.bus)
        .with_context(|| format!("cannot open {}", config.bus.display()))?;
    let mut selector = ChannelSelector::with_settings(
        HalBus(i2c),
        StdTimer::new(),
        config.mux_address,
        config.settle_delay,
    );
    selector.deselect_all().with_context(|| {
        format!(
            "no multiplexer at {:#04x} on {}",
            config.mux_address,
            config.bus.display()
        )
    })?;
    info!(
        "multiplexer found at {:#04x} on {}",
        config.mux_address,
        config.bus.display()
    );
    Ok(selector)
}

async fn run(config: MuxConfig, cycles: Option<u64>) -> Result<ExitCode> {
    let token = CancellationToken::new();
    let stopper = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing current cycle");
            stopper.cancel();
        }
    });

    let stats = tokio::task::spawn_blocking(move || poll_sensors(&config, cycles, token))
        .await
        .context("poll thread panicked")??;

    println!("Stopping IMU reads.");
    info!("{}", stats);
    Ok(ExitCode::SUCCESS)
}

// All bus I/O happens on this one blocking thread
fn poll_sensors(
    config: &MuxConfig,
    cycles: Option<u64>,
    token: CancellationToken,
) -> Result<PollStats> {
    let selector = open_selector(config)?;
    let channels = config.channel_list()?;
    let mut factory = Mpu9250Factory::new(&config.bus);

    let mut registry = SessionRegistry::initialize_all(
        selector,
        &mut factory,
        &channels,
        config.sensor_configuration(),
    )
    .context("sensor initialization failed")?;

    let mut poll = PollLoop::new(StdTimer::new(), token).with_period(config.poll_period);
    if let Some(cycles) = cycles {
        poll = poll.with_max_cycles(cycles);
    }
    let stats = poll.run(&mut registry, &mut ConsoleSink::stdout());

    let mut selector = registry.into_parts();
    if let Err(e) = selector.deselect_all() {
        warn!("failed to release multiplexer: {}", e);
    }
    Ok(stats)
}

async fn scan(config: MuxConfig) -> Result<ExitCode> {
    tokio::task::spawn_blocking(move || scan_channels(&config))
        .await
        .context("scan thread panicked")?
}

fn scan_channels(config: &MuxConfig) -> Result<ExitCode> {
    let mut selector = open_selector(config)?;
    let mut probe_bus = I2cdev::new(&config.bus)
        .with_context(|| format!("cannot open {}", config.bus.display()))?;
    let address = config.sensor.address;
    let mut addresses = ADDRESSES.to_vec();
    if !addresses.contains(&address) {
        addresses.push(address);
    }

    let report = selector.scan(Channel::all(), &addresses, &ACCEPTED_IDS, |_, address| {
        probe_who_am_i(&mut probe_bus, address)
    });
    for entry in report.entries() {
        println!("Channel {} | {:#04x}: {}", entry.channel, entry.address, entry.outcome);
    }

    let sweep = selector.sweep_addresses(Channel::all(), |_, address| {
        probe_bus.read(address, &mut [0u8]).is_ok()
    });
    for entry in sweep.entries() {
        println!("Channel {} | devices: {}", entry.channel, entry.outcome);
    }

    let configured = config.channel_list()?;
    if report.all_detected(&configured, address) {
        info!("all {} configured channel(s) answered", configured.len());
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            "not every configured channel has a sensor at {:#04x}: {:?}",
            address, config.channels
        );
        Ok(ExitCode::FAILURE)
    }
}
