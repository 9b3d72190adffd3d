use reqwest::Client;
use serde::Serialize;

use super::{Notice, Notifier, NotifyError};
use crate::config::TelegramConfig;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage` channel.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, client: Client) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// Point at a different Bot API host (self-hosted server, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn render(notice: &Notice) -> String {
        format!(
            "🕒 Executed at: {}\n🌐 Domain: {}\n📥 Accounts: {}\n\n{}",
            notice.timestamp(),
            notice.domain,
            notice.account_count,
            escape_html(&notice.text())
        )
    }
}

/// The message is sent with `parse_mode=HTML`; server-supplied text must not
/// be read as markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: Self::render(notice),
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                service: "telegram",
                message: format!("HTTP {status}: {body}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_bot_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/{bot}/sendMessage",
                post(
                    move |State(c): State<Captured>,
                          Path(bot): Path<String>,
                          Json(body): Json<Value>| async move {
                        c.lock().unwrap().push((bot, body));
                        (status, "{}")
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn notifier(base: &str) -> TelegramNotifier {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "42".into(),
        };
        TelegramNotifier::new(&config, Client::new()).with_api_base(base)
    }

    #[tokio::test]
    async fn test_sends_message_payload() {
        let (base, captured) = spawn_bot_api(StatusCode::OK).await;
        let notice = Notice::new(
            "✅ Check-in complete",
            vec!["📧 ab****cd check-in succeeded: <b>ok</b>".into()],
            &AppConfig::default(),
        );

        notifier(&base).send(&notice).await.unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (bot, body) = &captured[0];
        assert_eq!(bot, "bot123:abc");
        assert_eq!(body["chat_id"], "42");
        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["disable_web_page_preview"], true);
        let text = body["text"].as_str().unwrap();
        assert!(text.contains("🌐 Domain: ht****nl"));
        assert!(text.contains("✅ Check-in complete"));
        assert!(text.contains("&lt;b&gt;ok&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn test_http_error_is_rejected() {
        let (base, _) = spawn_bot_api(StatusCode::UNAUTHORIZED).await;
        let notice = Notice::new("x", Vec::new(), &AppConfig::default());
        let err = notifier(&base).send(&notice).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { service: "telegram", .. }));
    }

    #[test]
    fn test_unconfigured_without_chat_id() {
        let config = TelegramConfig {
            bot_token: "t".into(),
            chat_id: String::new(),
        };
        assert!(!TelegramNotifier::new(&config, Client::new()).is_configured());
    }
}
