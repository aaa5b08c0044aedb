//! handsign - hand gesture classifier for landmark streams
//!
//! Reads detector frames from stdin (or a file) and writes gesture
//! labels to stdout, one s-expression per line.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use handsign::hand::{DistanceTest, ExtractorConfig};
use handsign::ipc::StreamServer;
use handsign::state::{SessionConfig, SessionState};

#[derive(Parser, Debug)]
#[command(name = "handsign", about = "Classify hand gestures from landmark frames")]
struct Cli {
    /// Read requests from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Minimum outward thumb tip displacement, in landmark units
    #[arg(long, default_value_t = 0.05)]
    thumb_margin: f32,

    /// Require fingertip reach of at least this multiple of the PIP reach
    #[arg(long)]
    distance_ratio: Option<f32>,

    /// Majority-vote window in frames (1 disables smoothing)
    #[arg(long, default_value_t = 1)]
    smoothing_window: usize,

    /// Log all requests and responses to stderr
    #[arg(long)]
    trace: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handsign {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handsign=info".into()),
        )
        .init();

    info!("handsign v{} starting", env!("CARGO_PKG_VERSION"));

    let config = SessionConfig {
        extractor: ExtractorConfig {
            thumb_margin: cli.thumb_margin,
            distance_test: match cli.distance_ratio {
                Some(min_ratio) => DistanceTest::Ratio { min_ratio },
                None => DistanceTest::Absolute,
            },
        },
        smoothing_window: cli.smoothing_window,
    };
    let mut state = SessionState::new(config).context("invalid configuration")?;
    let mut server = StreamServer::new(cli.trace);
    let stdout = io::stdout().lock();

    let stats = match cli.input {
        Some(path) => {
            info!("reading frames from {}", path.display());
            let file = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            server.serve(&mut state, BufReader::new(file), stdout)?
        }
        None => server.serve(&mut state, io::stdin().lock(), stdout)?,
    };

    info!(
        requests = stats.requests,
        classified = state.hands_classified,
        rejected = state.hands_rejected,
        "done"
    );
    Ok(())
}
