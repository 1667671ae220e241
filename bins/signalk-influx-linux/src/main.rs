use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signalk_influx::source::{run_lines, run_websocket, SourceError};
use signalk_influx::{InfluxSink, InfluxWriter, WriterConfig};

/// Write SignalK deltas to InfluxDB.
#[derive(Debug, Parser)]
#[command(name = "signalk-influx", version)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Override the vessel identifier from the configuration
    #[arg(long)]
    self_id: Option<String>,

    /// SignalK stream to read deltas from
    #[arg(
        long,
        default_value = "ws://localhost:3000/signalk/v1/stream?subscribe=self"
    )]
    url: String,

    /// Read newline-delimited JSON deltas from stdin instead of a stream
    #[arg(long, conflicts_with = "url")]
    stdin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,signalk_influx=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = WriterConfig::from_file(&args.config)?;
    if let Some(self_id) = &args.self_id {
        config.self_id = self_id.clone();
        config.validate()?;
    }

    let sink = InfluxSink::new(&config.influx)?;
    tracing::info!("Writing to {}", sink.write_url());

    let mut writer = InfluxWriter::new(&config, Arc::new(sink));
    tracing::info!(
        "Recording {} (batch size {})",
        writer.self_context(),
        config.batch_size
    );

    let outcome = tokio::select! {
        result = run_source(&args, &mut writer) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
            Ok(0)
        }
    };

    writer.shutdown().await;
    let deltas = outcome?;

    tracing::info!("Shutdown complete ({} deltas read)", deltas);
    Ok(())
}

async fn run_source(args: &Args, writer: &mut InfluxWriter<InfluxSink>) -> Result<u64, SourceError> {
    if args.stdin {
        tracing::info!("Reading deltas from stdin");
        run_lines(BufReader::new(tokio::io::stdin()), writer).await
    } else {
        run_websocket(&args.url, writer).await
    }
}
