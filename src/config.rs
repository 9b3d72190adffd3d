//! TOML configuration with environment variable overrides.
//!
//! Values are layered: compiled-in defaults, then an optional TOML file, then
//! the environment (`DOMAIN`, `ACCOUNTS`, `TRIGGER_PATH`, `TG_BOT_TOKEN`,
//! `TG_CHAT_ID`, `SC_KEY`, `MAX_RETRY`). The result is immutable for the
//! lifetime of the process and passed explicitly to every component.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkin::mask::mask;
use crate::checkin::Account;
use crate::retry::RetryPolicy;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "AUTOCHECKIN_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Primary base URL of the check-in service.
    pub domain: String,
    /// HTTP path that triggers a batch run.
    pub trigger_path: String,
    /// Attempts per account, including the first.
    pub max_retry: u32,
    pub retry_base_delay_ms: u64,
    /// Pause between login and check-in.
    pub settle_delay_ms: u64,
    pub accounts: Vec<Account>,
    pub telegram: TelegramConfig,
    pub serverchan: ServerChanConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            domain: "https://ikuuu.nl".to_string(),
            trigger_path: "/auto-checkin".to_string(),
            max_retry: 3,
            retry_base_delay_ms: 3000,
            settle_delay_ms: 1500,
            accounts: Vec::new(),
            telegram: TelegramConfig::default(),
            serverchan: ServerChanConfig::default(),
            server: ServerConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerChanConfig {
    pub send_key: String,
}

impl ServerChanConfig {
    pub fn is_configured(&self) -> bool {
        !self.send_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    /// Seven-field cron expression (seconds first), evaluated in UTC.
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: "0 0 1 * * *".to_string(), // 01:00 UTC daily
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Parse configuration from a TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Build the effective configuration: file (if any), then process env.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match std::env::var(CONFIG_ENV) {
                Ok(p) if !p.is_empty() => Self::from_file(Path::new(&p))?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        config.log_summary();
        Ok(config)
    }

    /// Override fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(domain) = get("DOMAIN") {
            self.domain = domain.trim().to_string();
        }
        if let Some(raw) = get("ACCOUNTS") {
            self.accounts = parse_accounts(&raw);
        }
        if let Some(path) = get("TRIGGER_PATH") {
            self.trigger_path = path.trim().to_string();
        }
        if let Some(token) = get("TG_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat) = get("TG_CHAT_ID") {
            self.telegram.chat_id = chat;
        }
        if let Some(key) = get("SC_KEY") {
            self.serverchan.send_key = key;
        }
        if let Some(raw) = get("MAX_RETRY") {
            let n: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_RETRY is not an integer: {raw:?}"))?;
            // Zero or below still means one attempt.
            self.max_retry = u32::try_from(n.max(0)).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        if !self.domain.starts_with("http://") && !self.domain.starts_with("https://") {
            bail!("domain must be an http(s) URL, got {:?}", self.domain);
        }
        if !self.trigger_path.starts_with('/') {
            self.trigger_path = format!("/{}", self.trigger_path);
        }
        if self.trigger_path == "/" || self.trigger_path == "/health" {
            bail!("trigger_path {:?} collides with a built-in route", self.trigger_path);
        }
        if self
            .trigger_path
            .contains(|c: char| matches!(c, '{' | '}' | '*' | ':'))
        {
            bail!("trigger_path must be a literal path, got {:?}", self.trigger_path);
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retry,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Copy with secrets removed, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for account in &mut copy.accounts {
            account.email = mask(&account.email);
            account.password = "<redacted>".to_string();
        }
        if !copy.telegram.bot_token.is_empty() {
            copy.telegram.bot_token = "<redacted>".to_string();
        }
        if !copy.serverchan.send_key.is_empty() {
            copy.serverchan.send_key = "<redacted>".to_string();
        }
        copy
    }

    fn log_summary(&self) {
        info!(
            domain = %self.domain,
            accounts = self.accounts.len(),
            telegram = self.telegram.is_configured(),
            serverchan = self.serverchan.is_configured(),
            "Configuration loaded"
        );
    }
}

/// Parse `email1&pass1&email2&pass2` into accounts.
///
/// Entries are trimmed; a trailing email without a password is dropped.
pub fn parse_accounts(raw: &str) -> Vec<Account> {
    let parts: Vec<&str> = raw.split('&').collect();
    parts
        .chunks(2)
        .filter_map(|pair| match pair {
            [email, password] if !password.trim().is_empty() => {
                Some(Account::new(email.trim(), password.trim()))
            }
            _ => None,
        })
        .collect()
}
