//! autocheckin -- daily check-in for one or more accounts on a web service.
//!
//! This crate provides the check-in protocol client with domain fallback
//! and retry, the batch orchestrator, push notifications, and the HTTP and
//! cron triggers that start a batch.

pub mod api;
pub mod checkin;
pub mod config;
pub mod notify;
pub mod retry;
pub mod runner;
pub mod scheduler;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::runner::Runner;

/// Start the daemon: HTTP trigger server and, when enabled, the scheduler.
pub async fn serve(config: AppConfig) -> Result<()> {
    let config = Arc::new(config);
    let runner = Arc::new(Runner::new(config.clone()).context("Failed to build HTTP client")?);

    if config.schedule.enabled {
        let schedule = scheduler::CheckinSchedule::parse(&config.schedule.cron)?;
        let scheduler_runner = runner.clone();
        tokio::spawn(async move {
            scheduler::run_scheduler_loop(scheduler_runner, schedule).await;
        });
    } else {
        tracing::info!("Scheduler disabled");
    }

    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind))?;
    let app = api::router(api::state::AppState::new(runner));

    tracing::info!(%addr, trigger_path = %config.trigger_path, "autocheckin listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
