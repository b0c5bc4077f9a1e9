use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::db::services::TodoItemService;

/// Periodically logs how many incomplete items are past their due date.
pub struct OverdueMonitor {
    db: DatabaseConnection,
    period: Duration,
}

impl OverdueMonitor {
    pub fn new(db: DatabaseConnection, period: Duration) -> Self {
        Self { db, period }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "Overdue monitor started.");
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "Overdue check failed.");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Overdue monitor stopped.");
    }

    pub async fn run_cycle(&self) -> Result<u64, DbErr> {
        let overdue = TodoItemService::count_overdue(&self.db, Utc::now()).await?;
        if overdue > 0 {
            warn!(overdue, "Incomplete todo items are past their due date.");
        } else {
            info!(overdue, "No overdue todo items.");
        }
        Ok(overdue)
    }
}
