//! Provider name to handler lookup with lazy, at-most-once construction.

use crate::config::{AppConfig, HttpConfig, SmsTrafficConfig, SmscConfig};
use serde_json::Value;
use sms_core::{HandlerError, SendResult, SmsHandler};
use sms_smsc::{HttpSmscApi, SmscHandler};
use sms_smstraffic::SmsTrafficHandler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

type Constructor = Arc<dyn Fn() -> Result<Arc<dyn SmsHandler>, HandlerError> + Send + Sync>;

enum Slot {
    Uninitialized(Constructor),
    Ready(Arc<dyn SmsHandler>),
}

/// Registry of known providers.
///
/// Each name starts out holding a constructor; the first [`get_handler`](Self::get_handler)
/// call runs it and keeps the instance for every later lookup.
#[derive(Default)]
pub struct HandlerRegistry {
    slots: Mutex<HashMap<String, Slot>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every provider this crate ships, wired from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let http = config.http.clone();
        let smsc = config.providers.smsc.clone();
        let smstraffic = config.providers.smstraffic.clone();

        Self::new()
            .with(sms_smsc::PROVIDER, {
                let http = http.clone();
                move || build_smsc(&http, &smsc)
            })
            .with(sms_smstraffic::PROVIDER, move || {
                build_smstraffic(&http, &smstraffic)
            })
    }

    pub fn with<F>(self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SmsHandler>, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, constructor);
        self
    }

    /// Add or replace the constructor for `name`. A replaced live instance is dropped.
    pub fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Result<Arc<dyn SmsHandler>, HandlerError> + Send + Sync + 'static,
    {
        self.lock()
            .insert(name.into(), Slot::Uninitialized(Arc::new(constructor)));
    }

    /// Resolve `name`, constructing its handler on first use.
    pub fn get_handler(&self, name: &str) -> Result<Arc<dyn SmsHandler>, HandlerError> {
        let mut slots = self.lock();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| HandlerError::NotFound(name.to_string()))?;

        let handler = match slot {
            Slot::Ready(handler) => return Ok(Arc::clone(handler)),
            Slot::Uninitialized(constructor) => (**constructor)()?,
        };
        *slot = Slot::Ready(Arc::clone(&handler));
        info!(provider = name, "handler initialized");
        Ok(handler)
    }

    /// Whether `name` already has a live instance.
    pub fn is_ready(&self, name: &str) -> bool {
        matches!(self.lock().get(name), Some(Slot::Ready(_)))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// `get_handler(provider)` followed by `send(input)`.
    pub async fn send_message(
        &self,
        provider: &str,
        input: &Value,
    ) -> Result<SendResult, HandlerError> {
        let handler = self.get_handler(provider)?;
        Ok(handler.send(input).await)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn init_error(name: &str, err: impl std::fmt::Display) -> HandlerError {
    HandlerError::Init {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

fn build_smsc(http: &HttpConfig, cfg: &SmscConfig) -> Result<Arc<dyn SmsHandler>, HandlerError> {
    let client = http
        .client()
        .map_err(|e| init_error(sms_smsc::PROVIDER, e))?;
    let api = HttpSmscApi::with_endpoint(
        cfg.login.clone(),
        cfg.password.clone(),
        cfg.endpoint.clone(),
    )
    .with_charset(cfg.charset.clone())
    .with_http_client(client);
    Ok(Arc::new(SmscHandler::new(api)))
}

fn build_smstraffic(
    http: &HttpConfig,
    cfg: &SmsTrafficConfig,
) -> Result<Arc<dyn SmsHandler>, HandlerError> {
    let client = http
        .client()
        .map_err(|e| init_error(sms_smstraffic::PROVIDER, e))?;
    let handler = SmsTrafficHandler::with_endpoint(cfg.endpoint.clone())
        .reject_http_errors(cfg.reject_http_errors)
        .with_http_client(client);
    Ok(Arc::new(handler))
}

static GLOBAL: OnceLock<HandlerRegistry> = OnceLock::new();

/// Process-wide registry.
///
/// Built from [`AppConfig::load`] on first access unless [`install_global`]
/// ran earlier.
pub fn global() -> &'static HandlerRegistry {
    GLOBAL.get_or_init(|| {
        let config = AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "configuration could not be loaded, using defaults");
            AppConfig::default()
        });
        HandlerRegistry::from_config(&config)
    })
}

/// Install the process-wide registry. Fails if one is already in place.
pub fn install_global(registry: HandlerRegistry) -> Result<(), HandlerRegistry> {
    GLOBAL.set(registry)
}
