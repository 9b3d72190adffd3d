use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Notice, Notifier, NotifyError};
use crate::config::ServerChanConfig;

const API_BASE: &str = "https://sctapi.ftqq.com";
const LEGACY_API_BASE: &str = "https://sc.ftqq.com";

const TITLE: &str = "iKuuu check-in report";

#[derive(Debug, Deserialize)]
struct TurboReply {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<TurboData>,
}

#[derive(Debug, Deserialize)]
struct TurboData {
    #[serde(default)]
    pushid: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LegacyReply {
    errno: i64,
    #[serde(default)]
    errmsg: Option<String>,
}

/// ServerChan push channel.
///
/// Sends through the current ("Turbo") API first. If that request cannot be
/// completed or its reply cannot be read, the legacy API is tried once.
pub struct ServerChanNotifier {
    client: Client,
    api_base: String,
    legacy_api_base: String,
    send_key: String,
}

impl ServerChanNotifier {
    pub fn new(config: &ServerChanConfig, client: Client) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
            legacy_api_base: LEGACY_API_BASE.to_string(),
            send_key: config.send_key.clone(),
        }
    }

    pub fn with_api_bases(mut self, api: impl Into<String>, legacy: impl Into<String>) -> Self {
        self.api_base = api.into();
        self.legacy_api_base = legacy.into();
        self
    }

    /// Markdown body: context block, the report, and a footer.
    fn render(notice: &Notice) -> String {
        let mut desp = format!(
            "**Executed at**: {}\n\n**Domain**: {}\n\n**Accounts**: {}\n\n---\n\n{}",
            notice.timestamp(),
            notice.domain,
            notice.account_count,
            notice.headline
        );
        for line in &notice.lines {
            desp.push_str("\n\n");
            desp.push_str(line);
        }
        desp.push_str("\n\n---\n*Sent by autocheckin*");
        desp
    }

    async fn send_turbo(&self, desp: &str) -> Result<TurboReply, reqwest::Error> {
        let url = format!("{}/{}.send", self.api_base, self.send_key);
        self.client
            .post(&url)
            .form(&[("title", TITLE), ("desp", desp)])
            .send()
            .await?
            .json::<TurboReply>()
            .await
    }

    async fn send_legacy(&self, desp: &str) -> Result<(), NotifyError> {
        let url = format!("{}/{}.send", self.legacy_api_base, self.send_key);
        let reply = self
            .client
            .post(&url)
            .form(&[("text", TITLE), ("desp", desp)])
            .send()
            .await?
            .json::<LegacyReply>()
            .await?;
        if reply.errno == 0 {
            debug!("ServerChan legacy API accepted the message");
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                service: "serverchan",
                message: reply
                    .errmsg
                    .unwrap_or_else(|| format!("errno {}", reply.errno)),
            })
        }
    }
}

#[async_trait::async_trait]
impl Notifier for ServerChanNotifier {
    fn name(&self) -> &'static str {
        "serverchan"
    }

    fn is_configured(&self) -> bool {
        !self.send_key.is_empty()
    }

    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        let desp = Self::render(notice);
        match self.send_turbo(&desp).await {
            Ok(reply) if reply.code == 0 => {
                debug!(pushid = ?reply.data.and_then(|d| d.pushid), "ServerChan accepted the message");
                Ok(())
            }
            Ok(reply) => Err(NotifyError::Rejected {
                service: "serverchan",
                message: reply
                    .message
                    .unwrap_or_else(|| format!("code {}", reply.code)),
            }),
            Err(e) => {
                warn!(error = %e, "ServerChan API failed, trying legacy API");
                self.send_legacy(&desp).await
            }
        }
    }
}
