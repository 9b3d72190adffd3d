use thiserror::Error;

/// Failures of a batch run or of a single account's check-in.
///
/// Only [`CheckinError::NoAccounts`] aborts a batch; every other variant is
/// scoped to one account and is retried, then recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckinError {
    #[error("no check-in accounts configured")]
    NoAccounts,

    #[error("login failed: {0}")]
    Login(String),

    #[error("no session cookie: {0}")]
    Session(String),

    #[error("check-in failed: {0}")]
    Checkin(String),

    #[error("all domains failed")]
    AllDomainsFailed,
}
