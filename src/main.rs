use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gemini_bridge::api::{self, AppState};
use gemini_bridge::events::{Event, EventLog};
use gemini_bridge::load_yaml_config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_yaml_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let events = EventLog::open(&config.event_log).await?;
    events
        .append(
            Event::new("server_start", "running").field("message", "Server is up and ready"),
        )
        .await;

    let state = AppState::new(config, events);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("gemini-bridge listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
