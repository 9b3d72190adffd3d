//! Push notifications for batch results.
//!
//! Every configured channel is sent concurrently and independently; a
//! channel that is unconfigured or fails is logged and never affects the
//! batch outcome.

pub mod serverchan;
pub mod telegram;

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

use crate::checkin::mask::mask;
use crate::config::AppConfig;

pub use self::serverchan::ServerChanNotifier;
pub use self::telegram::TelegramNotifier;

/// Report timestamps are shown in UTC+8, the service's home timezone.
const REPORT_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Upper bound on a single push request, so a stalled channel cannot hold
/// up the batch that is waiting on it.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client shared by the push channels.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{service} rejected the message: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
}

/// A batch summary plus the context every channel prints above it.
#[derive(Debug, Clone)]
pub struct Notice {
    pub headline: String,
    pub lines: Vec<String>,
    /// Masked service domain.
    pub domain: String,
    pub account_count: usize,
    pub created_at: DateTime<FixedOffset>,
}

impl Notice {
    pub fn new(headline: impl Into<String>, lines: Vec<String>, config: &AppConfig) -> Self {
        let offset = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS)
            .unwrap_or_else(|| Utc.fix());
        Self {
            headline: headline.into(),
            lines,
            domain: mask(&config.domain),
            account_count: config.accounts.len(),
            created_at: Utc::now().with_timezone(&offset),
        }
    }

    /// Headline followed by one line per entry.
    pub fn text(&self) -> String {
        let mut text = self.headline.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }

    pub fn timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// A push channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether credentials are present; unconfigured channels are skipped.
    fn is_configured(&self) -> bool;

    async fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// What happened to one channel during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped,
    Failed(String),
}

/// Build every supported channel from configuration.
pub fn from_config(config: &AppConfig, client: &Client) -> Vec<Box<dyn Notifier>> {
    let telegram: Box<dyn Notifier> =
        Box::new(TelegramNotifier::new(&config.telegram, client.clone()));
    let serverchan: Box<dyn Notifier> =
        Box::new(ServerChanNotifier::new(&config.serverchan, client.clone()));
    vec![telegram, serverchan]
}

/// Send `notice` on all channels at once and wait for every one to finish.
///
/// Never fails: errors are logged per channel and reported as
/// [`Delivery::Failed`].
pub async fn notify_all(notifiers: &[Box<dyn Notifier>], notice: &Notice) -> Vec<Delivery> {
    let sends = notifiers.iter().map(|notifier| async move {
        let name = notifier.name();
        if !notifier.is_configured() {
            info!(notifier = name, "Notifier not configured, skipping");
            return Delivery::Skipped;
        }
        match notifier.send(notice).await {
            Ok(()) => {
                info!(notifier = name, "Notification sent");
                Delivery::Sent
            }
            Err(e) => {
                error!(notifier = name, error = %e, "Notification failed");
                Delivery::Failed(e.to_string())
            }
        }
    });
    futures::future::join_all(sends).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        configured: bool,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send(&self, _notice: &Notice) -> Result<(), NotifyError> {
            if self.fail {
                Err(NotifyError::Rejected {
                    service: "fixed",
                    message: "quota exceeded".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_fan_out_reports_each_channel() {
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(Fixed {
                configured: true,
                fail: false,
            }),
            Box::new(Fixed {
                configured: false,
                fail: false,
            }),
            Box::new(Fixed {
                configured: true,
                fail: true,
            }),
        ];
        let notice = Notice::new("✅ done", vec!["line".into()], &AppConfig::default());
        let deliveries = notify_all(&notifiers, &notice).await;
        assert_eq!(
            deliveries,
            vec![
                Delivery::Sent,
                Delivery::Skipped,
                Delivery::Failed("fixed rejected the message: quota exceeded".into()),
            ]
        );
    }

    #[test]
    fn test_notice_text_and_context() {
        let mut config = AppConfig::default();
        config.accounts.push(crate::checkin::Account::new("a@b.cd", "p"));
        let notice = Notice::new("head", vec!["one".into(), "two".into()], &config);
        assert_eq!(notice.text(), "head\none\ntwo");
        assert_eq!(notice.domain, "ht****nl");
        assert_eq!(notice.account_count, 1);
        assert_eq!(notice.created_at.offset().local_minus_utc(), 8 * 3600);
    }

    #[tokio::test]
    async fn test_stalled_channel_times_out() {
        use crate::config::TelegramConfig;
        use tokio::net::TcpListener;

        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "42".into(),
        };
        let client = http_client(Duration::from_millis(200)).unwrap();
        let notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(
            TelegramNotifier::new(&config, client).with_api_base(&format!("http://{addr}")),
        )];
        let notice = Notice::new("✅ done", vec![], &AppConfig::default());

        let deliveries = tokio::time::timeout(
            Duration::from_secs(10),
            notify_all(&notifiers, &notice),
        )
        .await
        .expect("notify_all must not hang on a stalled channel");
        assert_eq!(deliveries.len(), 1);
        assert!(matches!(deliveries[0], Delivery::Failed(_)));
    }

    #[test]
    fn test_default_channels_unconfigured() {
        let client = Client::new();
        let notifiers = from_config(&AppConfig::default(), &client);
        assert_eq!(notifiers.len(), 2);
        assert!(notifiers.iter().all(|n| !n.is_configured()));
    }
}
