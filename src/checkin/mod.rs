//! Account check-in: the remote protocol client, its domain fallback, and
//! the batch orchestrator that turns per-account results into a report.

pub mod batch;
pub mod client;
pub mod cookies;
pub mod domains;
pub mod error;
pub mod mask;

use serde::{Deserialize, Serialize};

pub use self::batch::{run_batch, AccountResult, BatchReport};
pub use self::client::CheckinClient;
pub use self::error::CheckinError;

/// Credentials for one account on the remote service. Identity is the email.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of one account's check-in within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinOutcome {
    Success(String),
    Failure(String),
}

impl CheckinOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckinOutcome::Success(_))
    }
}

/// Performs the whole check-in for one account, returning the server's
/// human-readable status on success.
#[async_trait::async_trait]
pub trait AccountCheckin: Send + Sync {
    async fn checkin(&self, account: &Account) -> Result<String, CheckinError>;
}
