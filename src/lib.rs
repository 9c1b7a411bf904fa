//! # smsgate
//!
//! Dispatch layer that routes an outbound SMS to one of several gateway
//! providers and reports a normalized [`SendResult`](sms_core::SendResult).
//!
//! ## Features
//!
//! - **Providers**: `post.smsc.ru` and `post.smstraffic.ru`
//! - **Validation first**: malformed requests are rejected before any network call
//! - **Uniform results**: every provider reply maps onto the same ok/error record
//! - **Lazy registry**: one handler instance per provider, created on first use
//! - **Configuration**: layered files plus `SMSGATE__*` environment variables
//!
//! Per-message failures (bad input, gateway errors) come back as data.
//! Only an unknown provider name is an `Err`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = smsgate::send_message(
//!         "post.smstraffic.ru",
//!         &json!({ "phone": "79990000000", "text": "hi" }),
//!     )
//!     .await?;
//!     println!("{}", serde_json::to_string(&result)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod registry;

pub use config::*;
pub use registry::HandlerRegistry;

use serde_json::Value;
use sms_core::{HandlerError, SendResult};

/// Send `input` through the process-wide registry's `provider` handler.
pub async fn send_message(provider: &str, input: &Value) -> Result<SendResult, HandlerError> {
    registry::global().send_message(provider, input).await
}

/// Common imports for smsgate usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, HttpConfig, LoggingConfig, ProvidersConfig, SmsTrafficConfig, SmscConfig,
    };
    pub use crate::logging::init_tracing;
    pub use crate::registry::{HandlerRegistry, global, install_global};
    pub use crate::send_message;
    pub use sms_core::*;
    pub use sms_smsc::{HttpSmscApi, SmscApi, SmscHandler};
    pub use sms_smstraffic::SmsTrafficHandler;
}
