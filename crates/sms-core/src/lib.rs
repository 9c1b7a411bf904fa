//! # SMS Core
//!
//! Core traits and types for the smsgate SMS dispatch layer.
//!
//! This crate provides the building blocks every provider backend shares:
//! - [`ErrorCode`], the fixed error vocabulary reported to callers
//! - [`SendRequest::parse`], which turns untyped input into a typed request
//! - [`SendResult`], the normalized outcome of a send
//! - [`SmsHandler`], the provider contract (`send_raw`) and the common `send` flow
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::SmsHandler;
//! use serde_json::json;
//!
//! // Any provider backend implements SmsHandler
//! let result = handler
//!     .send(&json!({ "phone": "79990000000", "text": "hi" }))
//!     .await;
//! assert!(result.is_ok());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

/// Reason a message was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request is not a key/value record.
    UserDataType = 1,
    /// `phone` is absent.
    PhoneMissing = 2,
    /// `phone` is not a non-empty string.
    PhoneFormat = 3,
    /// `text` is absent.
    TextMissing = 4,
    /// `text` is not a non-empty string.
    TextFormat = 5,
    /// The provider or its transport failed.
    ExternalApi = 6,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        Self::UserDataType,
        Self::PhoneMissing,
        Self::PhoneFormat,
        Self::TextMissing,
        Self::TextFormat,
        Self::ExternalApi,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_u8() == code)
    }

    /// Human readable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            Self::UserDataType => "User data type error",
            Self::PhoneMissing => "Phone number: missed",
            Self::PhoneFormat => "Phone number: bad format",
            Self::TextMissing => "Message text: missed",
            Self::TextFormat => "Message text: bad format",
            Self::ExternalApi => "External API error",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_u8(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code {code}")))
    }
}

/// A validated outbound message.
///
/// Only [`SendRequest::parse`] turns caller input into a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRequest {
    pub phone: String,
    pub text: String,
}

/// Why [`SendRequest::parse`] refused an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Phone number, when it was already known to be valid.
    pub phone: Option<String>,
    pub code: ErrorCode,
}

impl SendRequest {
    pub fn new(phone: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            text: text.into(),
        }
    }

    /// Convert arbitrary caller input into a typed request.
    ///
    /// Checks run in a fixed order and the first failure wins: record shape,
    /// `phone` presence, `phone` format, `text` presence, `text` format.
    pub fn parse(input: &Value) -> Result<Self, Rejection> {
        let reject = |phone: Option<&str>, code| Rejection {
            phone: phone.map(str::to_owned),
            code,
        };

        let Some(record) = input.as_object() else {
            return Err(reject(None, ErrorCode::UserDataType));
        };
        let Some(phone) = record.get("phone") else {
            return Err(reject(None, ErrorCode::PhoneMissing));
        };
        let phone = match phone.as_str() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(reject(None, ErrorCode::PhoneFormat)),
        };
        let Some(text) = record.get("text") else {
            return Err(reject(Some(phone), ErrorCode::TextMissing));
        };
        let text = match text.as_str() {
            Some(t) if !t.is_empty() => t,
            _ => return Err(reject(Some(phone), ErrorCode::TextFormat)),
        };

        Ok(Self::new(phone, text))
    }

    /// Size of the message text in UTF-8 bytes.
    pub fn utf8_len(&self) -> usize {
        self.text.len()
    }
}

/// Validate `input` without keeping the typed request.
pub fn check(input: &Value) -> Option<SendResult> {
    SendRequest::parse(input).err().map(SendResult::from)
}

/// Normalized outcome of a send, identical for every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendResult {
    Ok {
        phone: String,
    },
    Error {
        phone: Option<String>,
        error_code: ErrorCode,
        error_msg: String,
    },
}

impl SendResult {
    pub fn ok(phone: impl Into<String>) -> Self {
        Self::Ok {
            phone: phone.into(),
        }
    }

    /// Error carrying the standard message for `code`.
    pub fn error(phone: Option<String>, code: ErrorCode) -> Self {
        Self::Error {
            phone,
            error_code: code,
            error_msg: code.message().to_string(),
        }
    }

    /// Provider failure ([`ErrorCode::ExternalApi`]) with the provider's own description.
    pub fn external(phone: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Error {
            phone: Some(phone.into()),
            error_code: ErrorCode::ExternalApi,
            error_msg: description.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn phone(&self) -> Option<&str> {
        match self {
            Self::Ok { phone } => Some(phone),
            Self::Error { phone, .. } => phone.as_deref(),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { error_code, .. } => Some(*error_code),
        }
    }
}

impl From<Rejection> for SendResult {
    fn from(r: Rejection) -> Self {
        Self::error(r.phone, r.code)
    }
}

/// Failure at the boundary between a handler and its provider transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or body read failure
    #[error("http error: {0}")]
    Http(String),
    /// No reply within the configured client timeout
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The request body or URL could not be built
    #[error("encode error: {0}")]
    Encode(String),
    /// Non-success HTTP status, only reported when status checking is enabled
    #[error("unexpected HTTP status: {0}")]
    Status(u16),
}

/// Errors raised while resolving a handler by provider name.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("handler not found: {0}")]
    NotFound(String),
    #[error("handler {name} failed to initialize: {reason}")]
    Init { name: String, reason: String },
}

/// A provider backend.
///
/// Implementors only provide [`SmsHandler::send_raw`]; callers use
/// [`SmsHandler::send`], which validates first and never reaches the provider
/// for a rejected input.
#[async_trait]
pub trait SmsHandler: Send + Sync {
    /// Stable provider key, e.g. "post.smsc.ru".
    fn name(&self) -> &'static str;

    /// Perform the provider call for an already validated request.
    async fn send_raw(&self, req: &SendRequest) -> SendResult;

    /// Validate, send and log exactly one line describing the outcome.
    async fn send(&self, input: &Value) -> SendResult {
        let result = match SendRequest::parse(input) {
            Err(rejection) => SendResult::from(rejection),
            Ok(req) => {
                let result = self.send_raw(&req).await;
                if let SendResult::Ok { phone } = &result {
                    info!(provider = self.name(), "{} bytes -> {}", req.utf8_len(), phone);
                    return result;
                }
                result
            }
        };
        info!(provider = self.name(), "{:?}", result);
        result
    }
}
