use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use scribe_core::Config;
use scribe_core::config_file;
use scribe_web::{AppState, ServerSettings};

// Hosted recognizers hold blocking HTTP clients, which must be created and
// dropped outside the async runtime. The extractor is built first and the
// last `Arc` is released after the runtime has shut down.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let file = config_file::load_config();
    let config = Config::default()
        .apply_file(&file)?
        .apply_env(|key| std::env::var(key).ok())?;
    let settings = ServerSettings::resolve(&file, |key| std::env::var(key).ok())?;
    let addr = settings.addr()?;

    let extractor = scribe_ingest::build_extractor(&config);
    for missing in extractor.unavailable() {
        tracing::warn!(
            capability = %missing.name,
            reason = %missing.reason,
            remediation = %missing.remediation,
            "unavailable"
        );
    }

    let state = Arc::new(AppState::new(extractor, settings.max_upload_bytes()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(Arc::clone(&state), addr));
    drop(runtime);
    drop(state);
    served
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

async fn serve(state: Arc<AppState>, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = scribe_web::app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
