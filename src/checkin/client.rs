//! Login → session capture → check-in against the remote service, walking
//! the fallback domains in order.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cookies::extract_session;
use super::error::CheckinError;
use super::mask::mask;
use super::{Account, AccountCheckin};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between login and check-in so the new session propagates server-side.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// `ret` values the service uses for a successful call.
const RET_DONE: i64 = 1;
const RET_ALREADY: i64 = 0;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    passwd: &'a str,
    code: &'a str,
    remember_me: bool,
}

/// Envelope shared by the login and check-in endpoints.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    ret: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

impl ApiReply {
    fn message(&self) -> Option<String> {
        self.msg
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Login,
    Checkin,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/auth/login",
            Endpoint::Checkin => "/user/checkin",
        }
    }
}

/// Browser-like header set; the service filters clients that lack it.
fn browser_headers(
    endpoint: Endpoint,
    domain: &str,
    cookie: Option<&str>,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_str(domain)?);
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );

    match endpoint {
        Endpoint::Login => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            headers.insert(
                header::REFERER,
                HeaderValue::from_str(&format!("{domain}/auth/login"))?,
            );
        }
        Endpoint::Checkin => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json;charset=UTF-8"),
            );
            headers.insert(
                header::REFERER,
                HeaderValue::from_str(&format!("{domain}/user"))?,
            );
            headers.insert(
                HeaderName::from_static("x-requested-with"),
                HeaderValue::from_static("XMLHttpRequest"),
            );
        }
    }

    if let Some(cookie) = cookie {
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie)?);
    }
    Ok(headers)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Check-in client bound to a fixed list of candidate domains.
///
/// A fresh session is captured on every attempt; nothing is shared between
/// accounts or retries.
pub struct CheckinClient {
    http: Client,
    domains: Vec<String>,
    settle_delay: Duration,
}

impl CheckinClient {
    pub fn new(domains: Vec<String>, settle_delay: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            domains,
            settle_delay,
        })
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Run the full protocol for one account against one domain.
    pub async fn checkin_on(&self, account: &Account, domain: &str) -> Result<String, CheckinError> {
        let who = mask(&account.email);
        info!(account = %who, %domain, "Logging in");
        let session = self.login(account, domain).await?;
        debug!(account = %who, "Session cookie captured");

        tokio::time::sleep(self.settle_delay).await;

        info!(account = %who, %domain, "Submitting check-in");
        let message = self.submit_checkin(domain, &session).await?;
        info!(account = %who, %domain, %message, "Check-in accepted");
        Ok(message)
    }

    /// Log in and return the session cookie string.
    async fn login(&self, account: &Account, domain: &str) -> Result<String, CheckinError> {
        let headers = browser_headers(Endpoint::Login, domain, None)
            .map_err(|e| CheckinError::Login(format!("invalid request header: {e}")))?;
        let response = self
            .http
            .post(format!("{domain}{}", Endpoint::Login.path()))
            .headers(headers)
            .json(&LoginRequest {
                email: &account.email,
                passwd: &account.password,
                code: "",
                remember_me: true,
            })
            .send()
            .await
            .map_err(|e| CheckinError::Login(e.to_string()))?;

        let status = response.status();
        let session = extract_session(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| CheckinError::Login(e.to_string()))?;
        let reply = serde_json::from_str::<ApiReply>(&body);
        debug!(%status, ret = ?reply.as_ref().ok().and_then(|r| r.ret), "Login response");

        if !status.is_success() {
            let reason = reply
                .ok()
                .and_then(|r| r.message())
                .unwrap_or_else(|| status_text(status));
            return Err(CheckinError::Login(reason));
        }

        let reply =
            reply.map_err(|e| CheckinError::Login(format!("unreadable login response: {e}")))?;
        match reply.ret {
            Some(RET_DONE) | Some(RET_ALREADY) => {}
            _ => {
                return Err(CheckinError::Login(
                    reply
                        .message()
                        .unwrap_or_else(|| "unexpected login response".to_string()),
                ));
            }
        }

        session.ok_or_else(|| {
            CheckinError::Session("login succeeded but no session cookie was set".to_string())
        })
    }

    async fn submit_checkin(&self, domain: &str, session: &str) -> Result<String, CheckinError> {
        let headers = browser_headers(Endpoint::Checkin, domain, Some(session))
            .map_err(|e| CheckinError::Checkin(format!("invalid request header: {e}")))?;
        let response = self
            .http
            .post(format!("{domain}{}", Endpoint::Checkin.path()))
            .headers(headers)
            .send()
            .await
            .map_err(|e| CheckinError::Checkin(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckinError::Checkin(e.to_string()))?;
        let reply = serde_json::from_str::<ApiReply>(&body);
        debug!(%status, ret = ?reply.as_ref().ok().and_then(|r| r.ret), "Check-in response");

        if !status.is_success() {
            let reason = reply
                .ok()
                .and_then(|r| r.message())
                .unwrap_or_else(|| status_text(status));
            return Err(CheckinError::Checkin(reason));
        }

        let reply = reply
            .map_err(|e| CheckinError::Checkin(format!("unreadable check-in response: {e}")))?;
        match reply.ret {
            Some(RET_DONE) => Ok(reply
                .message()
                .unwrap_or_else(|| "check-in succeeded".to_string())),
            Some(RET_ALREADY) => Ok(reply
                .message()
                .unwrap_or_else(|| "already checked in today".to_string())),
            _ => Err(CheckinError::Checkin(
                reply
                    .message()
                    .unwrap_or_else(|| "unexpected check-in response".to_string()),
            )),
        }
    }
}

#[async_trait::async_trait]
impl AccountCheckin for CheckinClient {
    async fn checkin(&self, account: &Account) -> Result<String, CheckinError> {
        let mut last_error = None;

        for domain in &self.domains {
            match self.checkin_on(account, domain).await {
                Ok(message) => return Ok(message),
                Err(e) => {
                    warn!(account = %mask(&account.email), %domain, error = %e, "Domain attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CheckinError::AllDomainsFailed))
    }
}
