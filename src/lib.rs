pub mod api;
pub mod app;
pub mod auth;
pub mod billing;
pub mod chat;
pub mod commands;
pub mod config;
mod error;
pub mod models;
#[cfg(test)]
mod testing;
mod utils;

pub use app::AppState;
pub use config::ClientConfig;
pub use error::ChatError;

use tracing_subscriber::EnvFilter;

pub fn run() {
    // Load .env file from the working directory or its parent
    config::load_dotenv();

    // Initialize tracing with RUST_LOG env filter
    // Default: warn for most crates, info for this crate
    // Logs go to stderr so they don't interleave with chat output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,metered_chat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(
        api_url = %config.api_url,
        token_store = ?config.token_store,
        "Starting metered-chat"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(&config);
    if let Err(e) = runtime.block_on(app::run_repl(state)) {
        tracing::error!("Terminal I/O failed: {}", e);
        std::process::exit(1);
    }
}
