use chrono::{Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::models::User;
use crate::database::store::Store;
use crate::utils::logging::log_system_event;

/// Every five minutes, at second zero.
pub const EXPIRY_SCHEDULE: &str = "0 */5 * * * *";

type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Periodically resets menu conversations the user walked away from.
pub struct MaintenanceService {
    store: Store,
    pending_ttl: Duration,
    scheduler: JobScheduler,
}

impl MaintenanceService {
    pub async fn new(store: Store, pending_ttl_minutes: i64) -> Result<Self, ServiceError> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            store,
            pending_ttl: Duration::minutes(pending_ttl_minutes),
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), ServiceError> {
        let store = self.store.clone();
        let ttl = self.pending_ttl;

        let expiry_job = Job::new_async(EXPIRY_SCHEDULE, move |_uuid, _l| {
            let store = store.clone();
            Box::pin(async move {
                if let Err(e) = expire_stale_modes(&store, ttl).await {
                    tracing::error!("Failed to expire pending interactions: {}", e);
                }
            })
        })?;

        self.scheduler.add(expiry_job).await?;
        self.scheduler.start().await?;

        tracing::info!(
            "Maintenance service started - expiring interactions idle for {} minutes",
            self.pending_ttl.num_minutes()
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), ServiceError> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    pub async fn run_now(&self) -> Result<Vec<i64>, sqlx::Error> {
        expire_stale_modes(&self.store, self.pending_ttl).await
    }
}

/// Resets every pending interaction last touched more than `ttl` ago.
pub async fn expire_stale_modes(store: &Store, ttl: Duration) -> Result<Vec<i64>, sqlx::Error> {
    if store.pool().is_closed() {
        return Ok(Vec::new());
    }

    let expired = User::expire_pending(store.pool(), Utc::now() - ttl).await?;
    if !expired.is_empty() {
        log_system_event(
            "Pending interactions expired",
            Some(&format!("{} user(s): {:?}", expired.len(), expired)),
        );
    }
    Ok(expired)
}
