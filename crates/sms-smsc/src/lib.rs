//! # smsc.ru SMS Provider
//!
//! Handler for the `post.smsc.ru` provider together with a small client for
//! the smsc.ru HTTP "send" command.
//!
//! The gateway replies with a comma separated line: `<id>,<sms count>,<cost>,<balance>`
//! when the message was accepted and `<id>,-<error code>` when it was not. The
//! handler only looks at how many fields came back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::SmsHandler;
//! use sms_smsc::{HttpSmscApi, SmscHandler};
//!
//! let handler = SmscHandler::new(HttpSmscApi::new("login", "password"));
//! let result = handler
//!     .send(&serde_json::json!({ "phone": "79990000000", "text": "hi" }))
//!     .await;
//! ```

use async_trait::async_trait;
use serde::Serialize;
use sms_core::{SendRequest, SendResult, SmsHandler, TransportError};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const PROVIDER: &str = "post.smsc.ru";
pub const DEFAULT_ENDPOINT: &str = "https://smsc.ru/sys/send.php";

/// Number of fields in an accepted reply: id, sms count, cost, balance.
const ACCEPTED_FIELDS: usize = 4;

/// The smsc.ru client capability the handler depends on.
#[async_trait]
pub trait SmscApi: Send + Sync {
    /// Submit one message and return the reply fields as sent by the gateway.
    async fn send_sms(&self, phone: &str, text: &str) -> Result<Vec<String>, TransportError>;
}

/// smsc.ru client over HTTP GET.
#[derive(Clone)]
pub struct HttpSmscApi {
    pub login: String,
    pub password: String,
    /// Send command URL; override for testing/mocking.
    pub endpoint: String,
    pub charset: String,
    http: reqwest::Client,
}

impl HttpSmscApi {
    pub fn new<S: Into<String>>(login: S, password: S) -> Self {
        Self::with_endpoint(login, password, DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint<S: Into<String>>(login: S, password: S, endpoint: String) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            endpoint,
            charset: "utf-8".to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, user agent).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}

impl fmt::Debug for HttpSmscApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSmscApi")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("charset", &self.charset)
            .finish()
    }
}

#[derive(Serialize)]
struct SmscSendQuery<'a> {
    login: &'a str,
    psw: &'a str,
    /// 1 = comma separated reply
    fmt: u8,
    charset: &'a str,
    /// 3 = include cost and balance in the reply
    cost: u8,
    phones: &'a str,
    mes: &'a str,
}

#[async_trait]
impl SmscApi for HttpSmscApi {
    async fn send_sms(&self, phone: &str, text: &str) -> Result<Vec<String>, TransportError> {
        let query = SmscSendQuery {
            login: &self.login,
            psw: &self.password,
            fmt: 1,
            charset: &self.charset,
            cost: 3,
            phones: phone,
            mes: text,
        };
        let res = self
            .http
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;
        let body = res.text().await.map_err(transport_error)?;
        debug!(provider = PROVIDER, reply = %body.trim(), "gateway reply");
        Ok(split_reply(&body))
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}

fn split_reply(body: &str) -> Vec<String> {
    body.trim().split(',').map(|f| f.trim().to_string()).collect()
}

/// Handler for the `post.smsc.ru` provider.
#[derive(Clone)]
pub struct SmscHandler {
    api: Arc<dyn SmscApi>,
}

impl SmscHandler {
    pub fn new(api: impl SmscApi + 'static) -> Self {
        Self { api: Arc::new(api) }
    }
}

#[async_trait]
impl SmsHandler for SmscHandler {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send_raw(&self, req: &SendRequest) -> SendResult {
        match self.api.send_sms(&req.phone, &req.text).await {
            Ok(reply) if reply.len() == ACCEPTED_FIELDS => SendResult::ok(&req.phone),
            Ok(reply) => SendResult::external(&req.phone, format!("{:?}", reply)),
            Err(e) => {
                debug!(provider = PROVIDER, error = %e, "smsc.ru request failed");
                SendResult::external(&req.phone, e.to_string())
            }
        }
    }
}
