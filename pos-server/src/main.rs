use pos_server::common::logger;
use pos_server::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger_with_file(Some(&config.log_level), Some(&config.work_dir));

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "POS server starting"
    );

    // 2. Storage, catalog, engine
    let state = AppState::initialize(&config)?;

    // 3. HTTP server
    let app = pos_server::api::router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
