use anyhow::Result;
use microgrid_monitor::{api, config::Config, state::AppState, telemetry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    telemetry::init_tracing();

    let cfg = Config::load()?;
    let addr = cfg.server.socket_addr()?;

    let mut state = AppState::new(cfg.clone()).await?;
    if cfg.server.enable_metrics {
        state = state.with_metrics(telemetry::init_metrics()?);
    }

    let app = api::router(state);

    if cfg.server.host == "0.0.0.0" {
        warn!("Server binding to 0.0.0.0, the API is reachable from the network");
    }
    info!(%addr, "starting microgrid monitor");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
