use codecritic::{
    api::CriticService,
    server::{create_app, AppState},
    Config,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins; records from the `log` facade are picked up too
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    config.validate()?;
    let service = CriticService::from_config(&config)?;

    info!("codecritic server starting");
    info!("Gemini model: {} ({} API key(s))", config.gemini.model, config.gemini.api_keys.len());
    info!("Allowed origins: {}", config.server.allowed_origins.join(", "));

    let app = create_app(AppState { service }, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("Server listening on http://{}", config.server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
