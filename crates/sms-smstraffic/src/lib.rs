//! # smstraffic.ru SMS Provider
//!
//! Handler for the `post.smstraffic.ru` provider. A message is one form POST
//! to the gateway; the reply body is read and discarded.
//!
//! Any exchange that completes without a transport error counts as success.
//! The HTTP status is only inspected when [`SmsTrafficHandler::reject_http_errors`]
//! is switched on.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use sms_core::{SendRequest, SendResult, SmsHandler, TransportError};
use tracing::debug;

pub const PROVIDER: &str = "post.smstraffic.ru";
pub const DEFAULT_ENDPOINT: &str = "https://api.smstraffic.ru/multi.php";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// smstraffic.ru HTTP client and handler.
#[derive(Clone, Debug)]
pub struct SmsTrafficHandler {
    /// Gateway URL; override for testing/mocking.
    pub endpoint: String,
    /// Report non-2xx replies as failures.
    pub reject_http_errors: bool,
    http: reqwest::Client,
}

impl Default for SmsTrafficHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SmsTrafficHandler {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reject_http_errors: false,
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, user agent).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn reject_http_errors(mut self, reject: bool) -> Self {
        self.reject_http_errors = reject;
        self
    }

    async fn post_form(&self, req: &SendRequest) -> Result<(), TransportError> {
        let body = encode_form(req)?;
        let res = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let reply = res.bytes().await.map_err(transport_error)?;
        debug!(provider = PROVIDER, %status, reply_len = reply.len(), "gateway reply");

        if self.reject_http_errors && !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct SmsTrafficForm<'a> {
    number: &'a str,
    message: &'a str,
}

/// URL-encoded form body for one message.
pub fn encode_form(req: &SendRequest) -> Result<String, TransportError> {
    let form = SmsTrafficForm {
        number: &req.phone,
        message: &req.text,
    };
    serde_urlencoded::to_string(&form).map_err(|e| TransportError::Encode(e.to_string()))
}

#[async_trait]
impl SmsHandler for SmsTrafficHandler {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send_raw(&self, req: &SendRequest) -> SendResult {
        match self.post_form(req).await {
            Ok(()) => SendResult::ok(&req.phone),
            Err(e) => {
                debug!(provider = PROVIDER, error = %e, "smstraffic.ru request failed");
                SendResult::external(&req.phone, e.to_string())
            }
        }
    }
}
