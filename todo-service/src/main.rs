use service_core::error::AppError;
use service_core::observability::init_tracing;
use todo_service::config::{TodoConfig, SERVICE_NAME};
use todo_service::services::init_metrics;
use todo_service::Application;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = TodoConfig::load()?;

    init_tracing(
        SERVICE_NAME,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics()?;

    tracing::info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        transactional_replace = config.bulk_replace.transactional,
        "Starting todo service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
