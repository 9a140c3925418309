use ecopulse_scoring::advice::AdviceGenerator;
use ecopulse_scoring::error::AppError;
use ecopulse_scoring::estimation::EcoEstimator;
use ecopulse_scoring::state::AppState;
use ecopulse_scoring::{api, config, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let dotenv = dotenvy::dotenv();
    let config = config::load_default()?;
    telemetry::init(config.log_level())?;
    if let Err(err) = dotenv
        && !err.not_found()
    {
        tracing::warn!(error = %err, "Failed to read .env file");
    }
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        "ecopulse scoring starting"
    );

    let estimator = Arc::new(EcoEstimator::new(config.estimator_config()));
    let loaded = {
        let estimator = Arc::clone(&estimator);
        tokio::task::spawn_blocking(move || estimator.load_if_present())
            .await
            .unwrap_or(false)
    };
    if !loaded {
        tracing::info!("No trained model on disk, serving fallback eco-points");
    }

    let api_key = std::env::var(config.api_key_env()).ok();
    let advisor = AdviceGenerator::new(config.advice_settings(api_key))?;
    if !advisor.has_api_key() {
        tracing::warn!(
            env = config.api_key_env(),
            "Advice API key not set, using canned advice"
        );
    }

    let app = api::router(AppState::new(estimator, advisor));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
