#![cfg(not(tarpaulin_include))]

use sheet_editor::app;
use sheet_editor::config::Config;
use std::env;

/// Main entry point for the web application
///
/// Usage: `sheet-editor [ADDR] [MAX_UPLOAD_MB]`
///
/// # Default Configuration
/// * Listens on 127.0.0.1:3000
/// * Accepts uploads up to 20 MB
///
/// Logging goes through `env_logger`; set `RUST_LOG` to change the level.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = Config::from_args(&args);

    log::info!(
        "Starting sheet editor on {} (upload limit {} bytes)",
        config.addr,
        config.max_upload_bytes
    );
    app::run(config).await
}
