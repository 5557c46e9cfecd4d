//! Environment-driven configuration.
//!
//! Every settings struct in this crate is plain `serde::Deserialize` with a
//! default for each key, so any of them can be loaded with [`EnvConfig`]:
//!
//! ```ignore
//! let campaign = CampaignConfig::from_env()?;
//! let server = ServerConfig::from_env_with_prefix("MAILSHOT")?;
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use config::ConfigError;

pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()
    }
}

/// Sending behaviour shared by every campaign entry point.
///
/// | Variable | Default |
/// |----------|---------|
/// | `DEFAULT_FROM_NAME` | `Mailshot` |
/// | `DEFAULT_FROM_EMAIL` | `noreply@example.com` |
/// | `SES_RATE_LIMIT` | `14` |
/// | `DEFAULT_BATCH_SIZE` | `10` |
/// | `DELAY_BETWEEN_EMAILS` | `80` (ms) |
/// | `DELAY_BETWEEN_BATCHES` | `1000` (ms) |
/// | `MAX_RETRIES` | `3` |
/// | `PAUSE_POLL_INTERVAL_MS` | `250` |
/// | `COMPANY_NAME` | `WebSparks AI` |
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_from_name")]
    pub default_from_name: String,

    #[serde(default = "default_from_email")]
    pub default_from_email: String,

    /// Provider sends-per-second ceiling. Reported, never enforced: the
    /// inter-email delays are the throttle.
    #[serde(rename = "ses_rate_limit", default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Upper bound for the batch size a bulk request may ask for.
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Delay between sends of a synchronous campaign, in milliseconds.
    #[serde(default = "default_delay_between_emails")]
    pub delay_between_emails: u64,

    /// Default delay between sends of a bulk job, in milliseconds.
    #[serde(default = "default_delay_between_batches")]
    pub delay_between_batches: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(rename = "pause_poll_interval_ms", default = "default_pause_poll")]
    pub pause_poll_interval: u64,

    #[serde(default = "default_company_name")]
    pub company_name: String,
}

fn default_from_name() -> String {
    "Mailshot".to_string()
}

fn default_from_email() -> String {
    "noreply@example.com".to_string()
}

fn default_rate_limit() -> u32 {
    14
}

fn default_batch_size() -> usize {
    10
}

fn default_delay_between_emails() -> u64 {
    80
}

fn default_delay_between_batches() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_pause_poll() -> u64 {
    250
}

fn default_company_name() -> String {
    "WebSparks AI".to_string()
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            default_from_name: default_from_name(),
            default_from_email: default_from_email(),
            rate_limit: default_rate_limit(),
            default_batch_size: default_batch_size(),
            delay_between_emails: default_delay_between_emails(),
            delay_between_batches: default_delay_between_batches(),
            max_retries: default_max_retries(),
            pause_poll_interval: default_pause_poll(),
            company_name: default_company_name(),
        }
    }
}

impl CampaignConfig {
    pub fn email_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_emails)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_batches)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval)
    }

    /// `"<n> emails/second"`, the form reported by health endpoints.
    pub fn rate_limit_label(&self) -> String {
        format!("{} emails/second", self.rate_limit)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated origins allowed to call the API from a browser.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origins() -> String {
    [
        "http://localhost:5173",
        "http://localhost:5174",
        "http://localhost:3000",
        "http://localhost:3001",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:3001",
    ]
    .join(",")
}

impl ServerConfig {
    pub fn cors_origins(&self) -> impl Iterator<Item = &str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}
