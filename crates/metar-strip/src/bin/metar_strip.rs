//! METAR Strip CLI
//!
//! Usage:
//!   metar-strip serve                  # Show live weather on the strip
//!   metar-strip off                    # Turn every LED off
//!   metar-strip test                   # Cycle every LED through the categories
//!   metar-strip identify <index>       # Flash one LED
//!   metar-strip rand                   # Random colors across the strip
//!   metar-strip version                # Print the version
//!   metar-strip -c /etc/metar-strip.yaml serve

use anyhow::Context;
use argh::FromArgs;
use std::path::PathBuf;

use metar_strip::demo::{CycleProducer, FlashProducer, RandomProducer};
use metar_strip::pipeline::{frame_channel, render_loop, shutdown_on_signal};
use metar_strip::{supervise, Config, DryRunStrip, MetarClient, Refresher};

/// METAR flight categories on an LED strip
#[derive(FromArgs)]
struct Args {
    /// path to the configuration file (default: config.yaml)
    #[argh(option, short = 'c', default = "default_config_path()")]
    config: PathBuf,

    /// show version information
    #[argh(switch, short = 'V')]
    version: bool,

    #[argh(subcommand)]
    command: Option<Command>,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("config.yaml")
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Serve(ServeArgs),
    Off(OffArgs),
    Test(TestArgs),
    Identify(IdentifyArgs),
    Rand(RandArgs),
    Version(VersionArgs),
}

/// Update the LED strip with METAR data
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct ServeArgs {}

/// Turn off all LEDs
#[derive(FromArgs)]
#[argh(subcommand, name = "off")]
struct OffArgs {}

/// Cycle through flight categories on the LED strip
#[derive(FromArgs)]
#[argh(subcommand, name = "test")]
struct TestArgs {}

/// Flash an LED to identify it
#[derive(FromArgs)]
#[argh(subcommand, name = "identify")]
struct IdentifyArgs {
    /// index of the LED to flash
    #[argh(positional)]
    index: usize,
}

/// Run random colors across the LEDs
#[derive(FromArgs)]
#[argh(subcommand, name = "rand")]
struct RandArgs {}

/// Print version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionArgs {}

fn print_version() {
    println!("metar-strip {}", env!("CARGO_PKG_VERSION"));
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::init_from_env(env);
}

fn strip_for(config: &Config) -> DryRunStrip {
    DryRunStrip::new(config.led.count, config.led.brightness, config.led.gpio_pin)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        print_version();
        return Ok(());
    }

    let command = match args.command {
        None => {
            eprintln!("METAR Strip - flight categories on an LED strip\n");
            eprintln!("Usage: metar-strip [-c <config>] <command>\n");
            eprintln!("Commands:");
            eprintln!("  serve     Update the LED strip with METAR data");
            eprintln!("  off       Turn off all LEDs");
            eprintln!("  test      Cycle through flight categories");
            eprintln!("  identify  Flash one LED: identify <index>");
            eprintln!("  rand      Random colors across the LEDs");
            eprintln!("  version   Print version information");
            eprintln!("\nRun 'metar-strip <command> --help' for more information.");
            return Ok(());
        }
        Some(Command::Version(_)) => {
            print_version();
            return Ok(());
        }
        Some(command) => command,
    };

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    setup_logging(&config.log_level);

    let strip = strip_for(&config);
    let off_frame = config.off_frame();

    match command {
        Command::Serve(_) => {
            let settings = config.serve_settings().context("invalid configuration")?;
            let refresher = Refresher::new(
                MetarClient::new(settings.base_url.clone()),
                settings.schedule.clone(),
                settings.stations.clone(),
            )?
            .with_colors(settings.colors.clone())
            .with_fetch_timeout(settings.fetch_timeout);

            log::info!(
                "Updating {} LEDs on schedule '{}'",
                settings.stations.len(),
                settings.schedule.expression()
            );
            supervise(refresher, strip, off_frame, shutdown_on_signal()?).await?;
        }
        Command::Off(_) => {
            let (frames_tx, frames_rx) = frame_channel();
            drop(frames_tx);
            let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
            render_loop(strip, frames_rx, off_frame, shutdown_rx).await?;
        }
        Command::Test(_) => {
            let cycle = CycleProducer::new(config.led.count);
            let cycle = match &config.serve.colors {
                Some(colors) => cycle.with_colors(colors.clone()),
                None => cycle,
            };
            log::info!("Starting test");
            supervise(cycle, strip, off_frame, shutdown_on_signal()?).await?;
        }
        Command::Identify(identify) => {
            let index = config.check_position(identify.index)?;
            log::info!("Flashing LED {}", index);
            supervise(FlashProducer::new(index), strip, off_frame, shutdown_on_signal()?).await?;
        }
        Command::Rand(_) => {
            log::info!("Starting rand");
            let random = RandomProducer::new(config.led.count);
            supervise(random, strip, off_frame, shutdown_on_signal()?).await?;
        }
        Command::Version(_) => print_version(),
    }

    log::info!("Shutting down");
    Ok(())
}
