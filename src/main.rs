use qrattend::api::AppState;
use qrattend::config::Config;
use qrattend::{logging, server};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = Config::load()?;
    info!(
        data_dir = %config.data_dir.display(),
        qr_dir = %config.qr_dir.display(),
        "Initializing stores..."
    );
    let state = Arc::new(AppState::initialize(config)?);

    server::serve(state).await
}
