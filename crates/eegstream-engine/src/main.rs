//! EEGStream demo - simulated board through the full analytics pipeline

use anyhow::Context;
use eegstream_acquisition::{BoardConfig, SimulatedBoard};
use eegstream_engine::{AnalyticsEngine, LogSink};
use eegstream_processing::{AnalyticsConfig, BandDefinition, LogisticModel, ScoreMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Starting EEGStream analytics engine...");
    println!("Signal Flow: Simulated Board → Conditioning Cascade → Band Powers → Scores");

    // Optional JSON config path as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path))?;
            AnalyticsConfig::from_json(&json).context("invalid configuration")?
        }
        None => AnalyticsConfig {
            bands: BandDefinition::eeg_bands(),
            score_mode: ScoreMode::Classifier,
            ..AnalyticsConfig::default()
        },
    };

    let session = SimulatedBoard::new(BoardConfig::default())
        .prepare()
        .context("failed to open board session")?;

    let engine = AnalyticsEngine::new(config, session.buffer(), Box::new(LogSink::new()))
        .context("failed to build analytics engine")?
        .with_model(Box::new(LogisticModel::relaxation()));
    let handle = engine.handle();

    let engine_task = tokio::spawn(engine.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    println!("Shutting down...");

    handle.stop();
    session.stop();

    engine_task
        .await
        .context("engine task panicked")?
        .context("engine terminated with an error")?;

    Ok(())
}
