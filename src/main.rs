//! # waynorm
//!
//! Replays a recorded seat session through the input normalizer and prints
//! the resulting semantic events as JSON lines on stdout.
//!
//! A trace is read from `--trace <FILE>`, or from stdin when no file is given.
//! With `--titlebar <HEIGHT>` the events also drive title bar gestures and the
//! window requests they produce are printed alongside the events.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

use waynorm::decoration::{TitlebarBounds, TitlebarGestures, WindowRequest};
use waynorm::dispatch::{Dispatcher, EventSink};
use waynorm::logging;
use waynorm::serial::SerialSource;
use waynorm::trace::TraceSource;
use waynorm::{InputNormalizer, NormalizerConfig, SemanticEvent};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "waynorm")]
#[command(about = "Replay Wayland seat input and print normalized semantic events")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/waynorm/waynorm.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// JSON-lines trace to replay (stdin if omitted)
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Treat everything above this logical y as a title bar
    #[arg(long)]
    titlebar: Option<i32>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// One line of output.
#[derive(Serialize)]
#[serde(untagged)]
enum Output<'a> {
    Event(&'a SemanticEvent),
    Request(&'a WindowRequest),
}

/// Prints events, and title bar requests when enabled.
struct PrintSink {
    gestures: Option<TitlebarGestures<TitlebarBounds>>,
    out: io::Stdout,
}

impl PrintSink {
    fn emit(&mut self, output: &Output<'_>) {
        match serde_json::to_string(output) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out.lock(), "{}", line) {
                    warn!("failed to write event: {}", e);
                }
            }
            Err(e) => warn!("failed to encode event: {}", e),
        }
    }
}

impl EventSink for PrintSink {
    fn dispatch(&mut self, event: &SemanticEvent, serials: &dyn SerialSource) {
        self.emit(&Output::Event(event));
        let request = self
            .gestures
            .as_mut()
            .and_then(|gestures| gestures.handle(event, serials));
        if let Some(request) = request {
            self.emit(&Output::Request(&request));
        }
    }

    fn batch_done(&mut self) {
        if let Err(e) = self.out.lock().flush() {
            warn!("failed to flush output: {}", e);
        }
    }
}

fn load_config(cli: &Cli) -> NormalizerConfig {
    match NormalizerConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            info!("📝 Using default configuration");
            NormalizerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.debug);

    info!("🚀 Starting waynorm");
    info!(
        "📄 Version: {} ({}, built {})",
        waynorm::VERSION,
        option_env!("WAYNORM_GIT_COMMIT").unwrap_or("unknown commit"),
        option_env!("WAYNORM_BUILD_DATE").unwrap_or("unknown")
    );

    let mut config = load_config(&cli);
    if cli.debug {
        config.general.debug = true;
    }

    if cli.print_config {
        let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
        print!("{}", rendered);
        return Ok(());
    }

    let gestures = cli.titlebar.map(|height| {
        info!("🪟 Title bar gestures enabled (height {})", height);
        TitlebarGestures::new(
            TitlebarBounds {
                x: 0,
                y: 0,
                width: i32::MAX,
                height,
            },
            &config.click,
        )
    });
    let sink = PrintSink {
        gestures,
        out: io::stdout(),
    };

    let source = match &cli.trace {
        Some(path) => TraceSource::open(path)?,
        None => {
            info!("📥 Reading trace from stdin");
            TraceSource::from_reader(BufReader::new(io::stdin()))
        }
    };

    let handle = Dispatcher::spawn(InputNormalizer::new(config), source, sink)?;
    let stopper = handle.shutdown_handle();
    let mut replay = tokio::task::spawn_blocking(move || handle.join());

    let finished = tokio::select! {
        joined = &mut replay => Some(joined),
        _ = tokio::signal::ctrl_c() => None,
    };
    let joined = match finished {
        Some(joined) => joined,
        None => {
            info!("🛑 Interrupted, stopping replay");
            stopper.shutdown();
            // A transport blocked on stdin only notices shutdown after its next line.
            match tokio::time::timeout(SHUTDOWN_GRACE, replay).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("⚠️ Transport still blocked after {:?}, exiting", SHUTDOWN_GRACE);
                    return Ok(());
                }
            }
        }
    };
    let report = joined.context("Replay task failed")??;

    let normalizer = &report.normalizer;
    info!(
        "✅ Replay finished: {} item(s), {} fragment(s) applied, {} dropped",
        report.processed,
        normalizer.processed(),
        normalizer.dropped()
    );

    if let Some(message) = report.transport_error {
        anyhow::bail!("trace replay failed: {}", message);
    }

    Ok(())
}
