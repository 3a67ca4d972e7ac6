//! # Keeper Bot Main Entry Point
//!
//! Loads configuration, initializes logging and runs the bot until it is
//! asked to stop.

use anyhow::Result;
use tracing::info;

use keeper_bot::app::BotApp;
use keeper_bot::config::Config;
use keeper_bot::utils::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    info!("Starting Keeper Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Admins: {}",
        config.database_url,
        config.http_port,
        config.admin_user_ids.len()
    );

    let app = BotApp::initialize(config).await?;
    app.run().await
}
