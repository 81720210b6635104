use goalcast::{config, model, server, telemetry, PredictionService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load Config
    let config = config::AppConfig::from_env()?;

    // 2. Observability
    telemetry::init_tracing(&config.logging.level)?;
    let metrics = telemetry::install_metrics()?;

    // 3. Load the model before accepting traffic
    model::loader::init_ort()?;
    let goal_model = model::loader::load_model(&config.model)?;
    info!(
        path = %config.model.path,
        input = goal_model.input_name(),
        features = config.model.features.len(),
        "model loaded successfully"
    );
    let service = PredictionService::new(Arc::new(goal_model));

    // 4. Create Router
    let app = server::routes::create_router(service, metrics, &config.server);

    // 5. Bind & Serve
    let listener =
        TcpListener::bind(format!("{}:{}", config.server.host, config.server.port)).await?;
    info!(
        "Server listening on http://{}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
