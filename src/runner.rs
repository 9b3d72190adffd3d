//! One batch run end to end: check in every account, compose the summary,
//! fan it out to the notifiers.

use std::sync::Arc;

use tracing::info;

use crate::checkin::domains::fallback_domains;
use crate::checkin::{run_batch, BatchReport, CheckinClient, CheckinError};
use crate::config::AppConfig;
use crate::notify::{self, Delivery, Notice, Notifier};

/// What started a batch; only changes the wording of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Http,
    Scheduled,
    Cli,
}

impl Trigger {
    fn label(self) -> &'static str {
        match self {
            Trigger::Http | Trigger::Cli => "Check-in",
            Trigger::Scheduled => "Scheduled check-in",
        }
    }
}

/// Everything a batch run needs, built once from the configuration.
pub struct Runner {
    config: Arc<AppConfig>,
    client: CheckinClient,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Runner {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, reqwest::Error> {
        let client = CheckinClient::new(fallback_domains(&config.domain), config.settle_delay())?;
        let http = notify::http_client(notify::SEND_TIMEOUT)?;
        let notifiers = notify::from_config(&config, &http);
        info!(domains = ?client.domains(), "Check-in runner ready");
        Ok(Self {
            config,
            client,
            notifiers,
        })
    }

    /// Replace the notification channels.
    pub fn with_notifiers(mut self, notifiers: Vec<Box<dyn Notifier>>) -> Self {
        self.notifiers = notifiers;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn notifiers(&self) -> &[Box<dyn Notifier>] {
        &self.notifiers
    }

    /// Check in every configured account without notifying.
    pub async fn run(&self) -> Result<BatchReport, CheckinError> {
        run_batch(
            &self.config.accounts,
            &self.client,
            &self.config.retry_policy(),
        )
        .await
    }

    pub async fn notify(&self, notice: &Notice) -> Vec<Delivery> {
        notify::notify_all(&self.notifiers, notice).await
    }

    /// Run the batch and wait for every notification to settle.
    pub async fn run_and_notify(&self, trigger: Trigger) -> Result<BatchReport, CheckinError> {
        let result = self.run().await;
        let notice = compose_notice(trigger, &result, &self.config);
        self.notify(&notice).await;
        result
    }
}

/// Summary text for a batch result: a status banner and one line per
/// account, or the run-fatal error.
pub fn compose_notice(
    trigger: Trigger,
    result: &Result<BatchReport, CheckinError>,
    config: &AppConfig,
) -> Notice {
    let label = trigger.label();
    match result {
        Ok(report) if report.all_succeeded() => {
            Notice::new(format!("✅ {label} complete"), report.lines(), config)
        }
        Ok(report) => Notice::new(
            format!(
                "⚠️ {label} finished with {} failure(s)",
                report.failure_count()
            ),
            report.lines(),
            config,
        ),
        Err(e) => Notice::new(format!("❌ {label} failed"), vec![e.to_string()], config),
    }
}
