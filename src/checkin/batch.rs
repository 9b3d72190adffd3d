use chrono::{DateTime, TimeDelta, Utc};
use tracing::{error, info};
use uuid::Uuid;

use super::error::CheckinError;
use super::mask::mask;
use super::{Account, AccountCheckin, CheckinOutcome};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// One account's line in a batch report. The email is stored masked.
#[derive(Debug, Clone)]
pub struct AccountResult {
    pub account: String,
    pub outcome: CheckinOutcome,
}

impl AccountResult {
    /// Human-readable report line.
    pub fn line(&self) -> String {
        match &self.outcome {
            CheckinOutcome::Success(msg) => {
                format!("📧 {} check-in succeeded: {}", self.account, msg)
            }
            CheckinOutcome::Failure(reason) => {
                format!("❌ {} check-in failed: {}", self.account, reason)
            }
        }
    }
}

/// Outcome of one pass over every configured account, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<AccountResult>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.results.iter().map(AccountResult::line).collect()
    }

    pub fn elapsed(&self) -> TimeDelta {
        self.finished_at - self.started_at
    }
}

/// Check in every account, one after another.
///
/// Each account runs under `retry`; its final failure is recorded in the
/// report and the batch moves on. Only an empty account list is an error.
pub async fn run_batch(
    accounts: &[Account],
    service: &dyn AccountCheckin,
    retry: &RetryPolicy,
) -> Result<BatchReport, CheckinError> {
    if accounts.is_empty() {
        return Err(CheckinError::NoAccounts);
    }

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, accounts = accounts.len(), "Batch check-in started");

    let mut results = Vec::with_capacity(accounts.len());
    for account in accounts {
        let masked = mask(&account.email);
        let outcome = match retry_with_backoff(retry, || service.checkin(account)).await {
            Ok(message) => {
                info!(%run_id, account = %masked, "Check-in succeeded");
                CheckinOutcome::Success(message)
            }
            Err(e) => {
                error!(%run_id, account = %masked, error = %e, "Check-in failed");
                CheckinOutcome::Failure(e.to_string())
            }
        };
        results.push(AccountResult {
            account: masked,
            outcome,
        });
    }

    let report = BatchReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        results,
    };
    info!(
        %run_id,
        failures = report.failure_count(),
        elapsed_ms = report.elapsed().num_milliseconds(),
        "Batch check-in finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted service: emails containing "bad" always fail, "flaky" fails
    /// once, everything else succeeds.
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<HashMap<String, u32>>,
    }

    impl Scripted {
        fn calls_for(&self, email: &str) -> u32 {
            self.calls.lock().unwrap().get(email).copied().unwrap_or(0)
        }
    }

    #[async_trait::async_trait]
    impl AccountCheckin for Scripted {
        async fn checkin(&self, account: &Account) -> Result<String, CheckinError> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                let n = calls.entry(account.email.clone()).or_insert(0);
                *n += 1;
                *n
            };
            if account.email.contains("bad") {
                Err(CheckinError::Login("wrong password".into()))
            } else if account.email.contains("flaky") && n == 1 {
                Err(CheckinError::Checkin("timeout".into()))
            } else {
                Ok(format!("ok #{n}"))
            }
        }
    }

    fn policy(max: u32) -> RetryPolicy {
        RetryPolicy::new(max, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_empty_accounts_fails_before_any_call() {
        let service = Scripted::default();
        let err = run_batch(&[], &service, &policy(3)).await.unwrap_err();
        assert_eq!(err, CheckinError::NoAccounts);
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_line_per_account_in_order() {
        let accounts = vec![
            Account::new("alice@example.com", "p"),
            Account::new("bad-bob@example.com", "p"),
            Account::new("carol@example.com", "p"),
        ];
        let service = Scripted::default();
        let report = run_batch(&accounts, &service, &policy(2)).await.unwrap();

        assert_eq!(report.results.len(), 3);
        let lines = report.lines();
        assert_eq!(lines[0], "📧 al****om check-in succeeded: ok #1");
        assert_eq!(
            lines[1],
            "❌ ba****om check-in failed: login failed: wrong password"
        );
        assert!(lines[2].starts_with("📧 ca****om"));
        assert!(!report.all_succeeded());
        assert_eq!(report.failure_count(), 1);
        assert!(report.finished_at >= report.started_at);
        assert!(report.elapsed() >= TimeDelta::zero());
    }

    #[tokio::test]
    async fn test_failing_account_retried_to_budget() {
        let accounts = vec![Account::new("bad@example.com", "p")];
        let service = Scripted::default();
        run_batch(&accounts, &service, &policy(3)).await.unwrap();
        assert_eq!(service.calls_for("bad@example.com"), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let accounts = vec![Account::new("flaky@example.com", "p")];
        let service = Scripted::default();
        let report = run_batch(&accounts, &service, &policy(3)).await.unwrap();
        assert!(report.all_succeeded());
        assert_eq!(
            report.results[0].outcome,
            CheckinOutcome::Success("ok #2".into())
        );
    }

    #[tokio::test]
    async fn test_zero_retry_budget_single_attempt() {
        let accounts = vec![Account::new("flaky@example.com", "p")];
        let service = Scripted::default();
        let report = run_batch(&accounts, &service, &policy(0)).await.unwrap();
        assert_eq!(service.calls_for("flaky@example.com"), 1);
        assert_eq!(report.failure_count(), 1);
    }
}
