use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use viewfinder::{Rotation, ViewfinderApp, ViewfinderConfig};

#[derive(Parser, Debug)]
#[command(name = "viewfinder")]
#[command(about = "Terminal camera viewfinder with capture, review and save")]
#[command(version)]
#[command(long_about = "A terminal camera viewfinder driven by a capture view-model. \
Takes stills from a simulated camera, lets you review them and saves accepted pictures \
as JPEG files. Supports lens flipping, torch, zoom, exposure and tap-to-focus from the keyboard.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "viewfinder.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH", help = "Write logs to this file")]
    log_file: Option<String>,

    /// Display rotation in degrees
    #[arg(long, value_name = "DEG", default_value_t = 0, allow_negative_numbers = true)]
    rotation: i32,

    /// Take one picture, accept it and exit
    #[arg(long, help = "Capture and save one picture without keyboard input")]
    script: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting viewfinder v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match ViewfinderConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let rotation = Rotation::from_degrees(args.rotation).ok_or_else(|| {
        anyhow!(
            "Unsupported rotation {}°: use a multiple of 90",
            args.rotation
        )
    })?;

    let mut app = ViewfinderApp::new(config, rotation).map_err(|e| {
        error!("Failed to create viewfinder: {}", e);
        e
    })?;

    let exit_code = if args.script {
        app.run_script().await
    } else {
        app.run().await
    }
    .map_err(|e| {
        error!("Viewfinder error: {}", e);
        e
    })?;

    info!("Viewfinder exited with code: {}", exit_code);
    if exit_code != 0 {
        drop(app);
        drop(log_guard);
        std::process::exit(exit_code);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("viewfinder={}", log_level)));

    // stdout carries the --print-config and --script output
    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow!("Failed to open log file {}: {}", path, e))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };
    let ansi = args.log_file.is_none();

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Viewfinder Configuration File");
    println!("# This is the default configuration with all available options");
    println!();
    println!("{}", ViewfinderConfig::default().to_toml()?);
    Ok(())
}
