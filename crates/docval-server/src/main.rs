mod configuration;
mod error;
mod routes;
mod state;

use axum::extract::DefaultBodyLimit;
use docval::{
    agent::Agent,
    providers::openai::OpenAiProvider,
    tools::{validation_tools, ValidationClient},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let validation = settings.validation.into_config();
    if !validation.is_configured() {
        tracing::warn!(
            "validation API is not configured; set DOCVAL_VALIDATION__API_URL and DOCVAL_VALIDATION__API_KEY"
        );
    }
    let client = Arc::new(ValidationClient::new(validation)?);

    let provider_config = settings.provider.into_config();
    info!(model = %provider_config.model, host = %provider_config.host, "using model provider");
    let provider = OpenAiProvider::new(provider_config)?;

    let mut agent = Agent::new(Box::new(provider))
        .with_prompt(settings.agent.prompt)
        .with_max_turns(settings.agent.max_turns());
    for tool in validation_tools(client) {
        agent.add_tool(tool);
    }

    let state = state::AppState::new(agent, settings.agent.timeout());

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state)
        .layer(DefaultBodyLimit::max(settings.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
