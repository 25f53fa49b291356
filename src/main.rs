use actix_web::HttpServer;
use partner_gateway::{create_app, logging::init_tracing, AppState, LoggingConfig};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = init_tracing(&LoggingConfig::from_env()) {
        eprintln!("failed to initialise logging: {e}");
    }

    // Shared across workers: one registry, one set of rate windows, one audit log
    let state = AppState::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;
    let bind_address = state.config.bind_address.clone();

    info!(
        bind_address = %bind_address,
        backend_url = %state.config.backend_url,
        timeout_ms = state.config.backend_timeout_ms,
        partners = state.pipeline.registry().len(),
        admin_enabled = state.config.admin_key.is_some(),
        "Partner API Gateway starting"
    );

    HttpServer::new(move || create_app(state.clone()))
        .bind(bind_address)?
        .run()
        .await
}
