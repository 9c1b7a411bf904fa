use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Outbound HTTP transport configuration
    pub http: HttpConfig,
    /// SMS providers configuration
    pub providers: ProvidersConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: pretty)
    pub format: String,
}

/// Outbound HTTP transport configuration, shared by all providers
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// User-Agent header sent to gateways
    pub user_agent: String,
}

/// SMS providers configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    /// post.smsc.ru configuration
    pub smsc: SmscConfig,
    /// post.smstraffic.ru configuration
    pub smstraffic: SmsTrafficConfig,
}

/// smsc.ru provider configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct SmscConfig {
    /// Account login
    pub login: String,
    /// Account password
    pub password: String,
    /// Send command URL (default: https://smsc.ru/sys/send.php)
    pub endpoint: String,
    /// Message charset (default: utf-8)
    pub charset: String,
}

/// smstraffic.ru provider configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmsTrafficConfig {
    /// Gateway URL
    pub endpoint: String,
    /// Treat non-2xx replies as failures (default: false)
    pub reject_http_errors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("smsgate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for SmscConfig {
    fn default() -> Self {
        Self {
            login: String::new(),
            password: String::new(),
            endpoint: sms_smsc::DEFAULT_ENDPOINT.to_string(),
            charset: "utf-8".to_string(),
        }
    }
}

impl fmt::Debug for SmscConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmscConfig")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("charset", &self.charset)
            .finish()
    }
}

impl Default for SmsTrafficConfig {
    fn default() -> Self {
        Self {
            endpoint: sms_smstraffic::DEFAULT_ENDPOINT.to_string(),
            reject_http_errors: false,
        }
    }
}

impl HttpConfig {
    /// Build the HTTP client handed to provider transports.
    pub fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .user_agent(&self.user_agent)
            .build()
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSGATE_)
            .add_source(Environment::with_prefix("SMSGATE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
