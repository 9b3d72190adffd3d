use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use super::CheckinSchedule;
use crate::runner::{Runner, Trigger};

/// Main scheduler execution loop.
///
/// Sleeps until the next fire time, runs one batch with notifications, and
/// repeats. Runs never overlap: the next fire time is computed only after the
/// previous batch finished.
pub async fn run_scheduler_loop(runner: Arc<Runner>, schedule: CheckinSchedule) {
    info!(cron = schedule.expr(), "Scheduler engine started");

    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(&now) else {
            warn!(cron = schedule.expr(), "Schedule has no upcoming runs, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(next = %next.to_rfc3339(), "Next scheduled check-in");
        tokio::time::sleep(wait).await;

        info!("Scheduled check-in started");
        match runner.run_and_notify(Trigger::Scheduled).await {
            Ok(report) => {
                info!(
                    run_id = %report.run_id,
                    failures = report.failure_count(),
                    "Scheduled check-in finished"
                );
            }
            Err(e) => {
                error!(error = %e, "Scheduled check-in failed");
            }
        }
    }
}
