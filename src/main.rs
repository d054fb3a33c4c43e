//! Laser Touch CLI
//!
//! Publishes touches detected by a planar laser scanner as OSC messages.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use laser_touch::{
    app::{udp_sink_factory, AppContext, SinkFactory},
    config::{Config, OscConfig, Overrides},
    emitter::{EventEmitter, SendingMode},
    sensor::{Direction, NoopSource, ReplaySource, ScanFrame, ScanSource},
    transport::{MemorySink, MessageSink, TransportError},
    RunClusterer, TouchEventPipeline, VERSION,
};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "laser-touch")]
#[command(version = VERSION)]
#[command(about = "Turns laser scanner sweeps into OSC touch events", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live touch feed
    Run {
        /// Play back a recorded scan session instead of a live scanner
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Restart the recording when it ends
        #[arg(long = "loop")]
        loop_replay: bool,

        /// OSC target host
        #[arg(long)]
        host: Option<String>,

        /// OSC target port
        #[arg(long)]
        port: Option<u16>,

        /// Sending mode (point, points-as-string, clustered-point, clustered-points-as-string)
        #[arg(long)]
        mode: Option<String>,

        /// Scanner facing direction (up, down, left, right)
        #[arg(long)]
        facing: Option<String>,

        /// Disable mirroring
        #[arg(long)]
        no_mirror: bool,

        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a recorded session through the pipeline once and print the results
    Process {
        /// JSON-lines recording, one scan frame per line
        recording: PathBuf,

        /// Sending mode used to render the messages
        #[arg(long)]
        mode: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            replay,
            loop_replay,
            host,
            port,
            mode,
            facing,
            no_mirror,
            dry_run,
        } => {
            let facing = match facing {
                Some(facing) => Some(
                    Direction::parse(&facing)
                        .with_context(|| format!("unknown facing direction {facing:?}"))?,
                ),
                None => None,
            };
            let overrides = Overrides {
                host,
                port,
                sending_mode: mode.as_deref().map(parse_mode).transpose()?,
                facing,
                no_mirror,
            };
            cmd_run(config, &overrides, cli.config, replay, loop_replay, dry_run)
        }
        Commands::Process { recording, mode } => {
            let mode = match mode {
                Some(mode) => parse_mode(&mode)?,
                None => config.sending_mode,
            };
            cmd_process(&config, &recording, mode)
        }
        Commands::Config => cmd_config(&config, cli.config.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "laser_touch=debug"
    } else {
        "laser_touch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {path:?}")),
        None => Config::load().context("failed to load configuration"),
    }
}

fn parse_mode(s: &str) -> anyhow::Result<SendingMode> {
    match SendingMode::parse(s) {
        Some(mode) => Ok(mode),
        None => bail!("unknown sending mode {s:?}"),
    }
}

fn cmd_run(
    mut config: Config,
    overrides: &Overrides,
    config_path: Option<PathBuf>,
    replay: Option<PathBuf>,
    loop_replay: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    overrides.apply_to(&mut config);

    println!("Laser Touch v{VERSION}");
    println!();

    let source: Box<dyn ScanSource> = match &replay {
        Some(path) => Box::new(
            ReplaySource::open(path, loop_replay, config.surface.facing, config.scan)
                .context("failed to start replay")?,
        ),
        None => {
            warn!("no scanner driver available, running without scan input");
            Box::new(NoopSource::new(config.surface.facing))
        }
    };

    let sink_factory: SinkFactory = if dry_run {
        let sink = MemorySink::new();
        Box::new(move |_osc: &OscConfig| {
            Ok::<_, TransportError>(Box::new(sink.clone()) as Box<dyn MessageSink + Send>)
        })
    } else {
        udp_sink_factory()
    };

    println!(
        "  Screen: {}x{} mm, {} mm from the scanner, facing {:?}",
        config.surface.width_mm,
        config.surface.height_mm,
        config.surface.standoff_mm,
        config.surface.facing
    );
    println!(
        "  Output: {}x{} px, mirror {}",
        config.output.width_px,
        config.output.height_px,
        if config.mirror { "on" } else { "off" }
    );
    println!("  Sending mode: {:?}", config.sending_mode);
    if dry_run {
        println!("  Target: dry run (nothing is sent)");
    } else {
        println!(
            "  Target: {}:{} {}",
            config.osc.host, config.osc.port, config.osc.address
        );
    }

    let mut app = AppContext::new(config, source, sink_factory)?;

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    // Pick up edits to the configuration file while running.
    let watched = config_path.unwrap_or_else(Config::config_path);
    let mut last_modified = modified_time(&watched);
    let mut last_config_check = Instant::now();
    let mut last_report = Instant::now();
    let stats = app.stats();

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        if last_config_check.elapsed() >= Duration::from_secs(1) {
            let modified = modified_time(&watched);
            if modified.is_some() && modified != last_modified {
                last_modified = modified;
                reload_config(&mut app, &watched, overrides);
            }
            last_config_check = Instant::now();
        }

        app.tick();

        if last_report.elapsed() >= Duration::from_secs(5) {
            let snapshot = stats.snapshot();
            println!(
                "[{}] {:.1} fps | {} touches, {} clusters, {} messages",
                Utc::now().format("%H:%M:%S"),
                snapshot.frame_rate,
                snapshot.touches,
                snapshot.clusters,
                snapshot.messages
            );
            if let Some(entry) = app.history().latest() {
                println!("  last: {}", entry.description);
            }
            last_report = Instant::now();
        }

        thread::sleep(app.tick_interval().saturating_sub(started.elapsed()));
    }

    println!();
    println!("Stopping...");
    println!();
    println!("{}", stats.summary());
    Ok(())
}

/// Re-read the configuration file and apply it with the command-line
/// settings laid back on top.
fn reload_config(app: &mut AppContext, path: &Path, overrides: &Overrides) {
    let mut new = match Config::load_from(path) {
        Ok(new) => new,
        Err(e) => {
            warn!(error = %e, "ignoring invalid configuration file");
            return;
        }
    };
    overrides.apply_to(&mut new);

    match app.apply(new) {
        Ok(changes) if !changes.is_empty() => {
            info!(count = changes.len(), "configuration reloaded")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not apply configuration"),
    }
}

fn cmd_process(config: &Config, recording: &Path, mode: SendingMode) -> anyhow::Result<()> {
    let file = std::fs::File::open(recording)
        .with_context(|| format!("failed to open recording {recording:?}"))?;

    let surface = config.surface.to_surface();
    let pipeline = TouchEventPipeline::new(RunClusterer::new(
        config.clustering.min_run_length,
        config.clustering.resample_count,
    ));
    let sink = MemorySink::new();
    let mut emitter = EventEmitter::new(config.osc.address.clone(), Box::new(sink.clone()));

    let mut index = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.context("failed to read recording")?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: ScanFrame = serde_json::from_str(&line)
            .with_context(|| format!("malformed frame on line {}", index + 1))?;
        let frame = config.scan.apply(frame, config.surface.facing);

        let output = pipeline.process(&frame, &surface, config.output.size(), config.mirror);
        emitter.emit_frame(&output, mode);
        let messages: Vec<String> = sink.take().iter().map(|m| m.to_string()).collect();

        let record = serde_json::json!({
            "frame": index,
            "scan_points": frame.len(),
            "touches": output.touches,
            "clusters": output.clusters,
            "messages": messages,
        });
        println!("{record}");
        index += 1;
    }

    info!(frames = index, "recording processed");
    Ok(())
}

fn cmd_config(config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("failed to serialize configuration")?
    );
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
