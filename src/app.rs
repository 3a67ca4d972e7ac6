//! Startup and shutdown of the whole bot process.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::watch;
use tracing::info;

use crate::bot::commands::Command;
use crate::bot::dispatcher::UpdateDispatcher;
use crate::bot::handlers::{default_registry, schema};
use crate::bot::registry::HandlerRegistry;
use crate::bot::reply::outbox;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::health::HealthService;
use crate::services::maintenance::MaintenanceService;
use crate::utils::logging::log_system_event;

/// Upper bound for delivering queued replies after polling stopped.
pub const OUTBOX_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully initialized bot: database migrated, token verified, routes built.
pub struct BotApp {
    config: Config,
    bot: Bot,
    db: DatabaseManager,
    registry: HandlerRegistry,
    bot_username: String,
}

impl BotApp {
    pub async fn initialize(config: Config) -> Result<Self> {
        info!("Initializing database connection...");
        let db = DatabaseManager::new(&config.database_url)
            .await
            .context("Failed to open database")?;
        info!("Running database migrations...");
        db.run_migrations().await.context("Failed to run database migrations")?;
        info!("Database initialized successfully");

        info!("Initializing Telegram bot...");
        let bot = Bot::new(&config.telegram_bot_token);
        let me = bot
            .get_me()
            .await
            .context("Telegram rejected the bot token (getMe failed)")?;
        let bot_username = me.user.username.clone().unwrap_or_default();
        info!("Authorized as @{} ({})", bot_username, me.user.id);

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("Failed to publish the command list: {}", e);
        }

        let registry = default_registry().context("Invalid handler registry")?;
        tracing::debug!("Handler registry: {:?}", registry);

        Ok(Self { config, bot, db, registry, bot_username })
    }

    /// Runs until Ctrl-C or SIGTERM, then shuts everything down in order.
    pub async fn run(self) -> Result<()> {
        let BotApp { config, bot, db, registry, bot_username } = self;

        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
            .await
            .map_err(|e| anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

        let (replies, outbox) = outbox();
        let dispatcher = Arc::new(UpdateDispatcher::new(
            registry,
            db.store(),
            replies,
            config.admin_user_ids.iter().copied(),
            bot_username,
        ));
        let mut outbox_task = tokio::spawn(outbox.deliver(bot.clone()));

        info!("Initializing maintenance service...");
        let mut maintenance = MaintenanceService::new(db.store(), config.pending_ttl_minutes)
            .await
            .map_err(|e| anyhow!("Failed to create maintenance service: {}", e))?;
        if let Err(e) = maintenance.start().await {
            tracing::error!("Failed to start maintenance service: {}", e);
        }

        let (stop_health, mut health_stopped) = watch::channel(false);
        let health = HealthService::new(db.store(), dispatcher.stats());
        info!("Health check server starting on port {}", config.http_port);
        let health_task = tokio::spawn(health.serve(listener, async move {
            let _ = health_stopped.changed().await;
        }));

        let mut telegram = Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![Arc::clone(&dispatcher)])
            .error_handler(LoggingErrorHandler::with_custom_text("An error from the update handler"))
            .build();

        let token = telegram.shutdown_token();
        tokio::spawn(async move {
            shutdown_signal().await;
            log_system_event("Shutdown requested", None);
            match token.shutdown() {
                Ok(stopped) => stopped.await,
                Err(e) => tracing::warn!("Dispatcher was not running: {:?}", e),
            }
        });

        log_system_event("Bot started", Some("long polling"));
        telegram.dispatch().await;
        drop(telegram);
        log_system_event("Polling stopped", None);

        dispatcher.wait_idle().await;
        dispatcher.close();

        match tokio::time::timeout(OUTBOX_DRAIN_TIMEOUT, &mut outbox_task).await {
            Ok(Ok(delivered)) => info!("Outbox drained ({} replies delivered)", delivered),
            Ok(Err(e)) => tracing::error!("Outbox task failed: {}", e),
            Err(_) => {
                tracing::warn!("Outbox did not drain within {:?}, dropping pending replies", OUTBOX_DRAIN_TIMEOUT);
                outbox_task.abort();
            }
        }

        if let Err(e) = maintenance.stop().await {
            tracing::warn!("Error stopping maintenance service: {}", e);
        }

        let _ = stop_health.send(true);
        match health_task.await {
            Ok(Err(e)) => tracing::error!("Health server error: {}", e),
            Err(e) => tracing::error!("Health task error: {}", e),
            Ok(Ok(())) => {}
        }

        db.close().await;
        log_system_event("Application stopped", None);
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
