//! Number-match engine runner (default binary).
//!
//! Spawns the engine actor and serves the renderer adapter over TCP until
//! Ctrl-C. Configuration comes from `NUMBER_MATCH_*` environment variables and
//! log filtering from `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use number_match::adapter::{run_server, ServerConfig};
use number_match::engine::{Engine, EngineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine_config = EngineConfig::from_env().context("invalid engine configuration")?;
    let server_config = ServerConfig::from_env().context("invalid adapter configuration")?;

    info!(
        seed = engine_config.seed,
        win_delay_ms = engine_config.timings.win_delay_ms,
        hint_idle_ms = engine_config.timings.hint_idle_ms,
        hint_display_ms = engine_config.timings.hint_display_ms,
        max_pending = engine_config.max_pending,
        "starting number-match"
    );

    let engine = Engine::spawn(engine_config);

    let outcome = tokio::select! {
        result = run_server(server_config, engine.handle(), None) => result,
        signal = tokio::signal::ctrl_c() => {
            info!("shutting down");
            signal.context("failed to listen for ctrl-c")
        }
    };

    let session = engine.shutdown().await?;
    info!(episodes = session.episode_id(), "engine stopped");

    outcome
}
