use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

mod app;
mod http;
mod pipeline;
#[cfg(test)]
mod test_support;

/// LINE webhook bot answering with OpenAI chat completions.
#[derive(Debug, Parser)]
#[command(name = "kaiwa-gateway", version)]
struct Cli {
    /// Path to kaiwa.toml (falls back to KAIWA_CONFIG, then ./kaiwa.toml).
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listening port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kaiwa_gateway=info,kaiwa_agent=info,kaiwa_store=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let mut config = kaiwa_core::KaiwaConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    // credentials are mandatory
    config.validate()?;

    info!(path = %config.database.path, "opening SQLite database");
    let store = kaiwa_store::ExchangeStore::open(&config.database.path)?;

    let provider = kaiwa_agent::openai::OpenAiProvider::new(
        config.providers.openai.api_key.clone(),
        Some(config.providers.openai.base_url.clone()),
    );
    let prompt = kaiwa_agent::prompt::SystemPrompt::load(config.agent.system_prompt_path.as_deref());
    let agent = kaiwa_agent::AgentRuntime::new(Box::new(provider), prompt, config.agent.model.clone())
        .with_temperature(config.agent.temperature)
        .with_max_tokens(config.agent.max_tokens);
    info!(model = %agent.model(), "agent ready");

    let messenger = kaiwa_line::LineClient::new(
        config.line.access_token.clone(),
        Some(config.line.api_base_url.clone()),
    );

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;

    let state = Arc::new(app::AppState::new(config, agent, store, Box::new(messenger)));
    let router = app::build_router(state);

    info!("Kaiwa gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Kaiwa gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
