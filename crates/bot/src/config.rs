//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_TOKEN` - Telegram Bot API token (falls back to `BOT_TOKEN`)
//! - `ADMIN_ID` - Telegram user id of the single administrator
//!
//! ## Optional
//! - `HOST` - Bind address for the HTTP API (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `DATA_DIR` - Directory holding `users.json` and `orders.json` (default: data)
//! - `LOGS_DIR` - Directory holding `actions.log` (default: logs)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//!
//! ## Optional (content generation)
//! - `HF_API_KEY` - Hugging Face inference token; generation is disabled without it
//! - `HF_API_URL` - Inference endpoint (default: Qwen2.5-7B-Instruct)
//! - `HF_MAX_NEW_TOKENS` - Generation length (default: 300)
//! - `HF_TIMEOUT_SECS` - Request timeout (default: 25)
//!
//! ## Optional (manual payments)
//! - `PAYMENT_CARD_NUMBER` - Card shown on the purchase screen
//! - `PAYMENT_CARD_OWNER` - Card holder name
//! - `PAYMENT_PRICE` - Monthly price (default: 2500)
//! - `PAYMENT_CURRENCY` - Currency code (default: KZT)
//!
//! ## Optional (Sentry)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use lovesense_core::{CurrencyCode, Price, UserId};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
pub const DEFAULT_HF_API_URL: &str =
    "https://api-inference.huggingface.co/models/Qwen/Qwen2.5-7B-Instruct";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Full configuration of the bot process.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram transport settings
    pub telegram: TelegramConfig,
    /// Identity allowed through the admin gate
    pub admin_id: UserId,
    /// IP address for the HTTP API
    pub host: IpAddr,
    /// Port for the HTTP API
    pub port: u16,
    /// File locations
    pub storage: StorageConfig,
    /// Content generation client
    pub generation: GenerationConfig,
    /// Manual payment instructions
    pub payment: PaymentConfig,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Telegram transport configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: SecretString,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Where the stores and the action log live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the user store file.
    #[must_use]
    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    /// Path of the order store file.
    #[must_use]
    pub fn orders_file(&self) -> PathBuf {
        self.data_dir.join("orders.json")
    }

    /// Path of the append-only action log.
    #[must_use]
    pub fn actions_log(&self) -> PathBuf {
        self.logs_dir.join("actions.log")
    }

    /// Load only the storage locations.
    ///
    /// Used by the operator CLI, which never talks to Telegram.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            data_dir: PathBuf::from(get_env_or_default("DATA_DIR", "data")),
            logs_dir: PathBuf::from(get_env_or_default("LOGS_DIR", "logs")),
        }
    }
}

/// Content generation configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_url: String,
    /// `None` disables generation; users get a fixed advisory instead.
    pub api_key: Option<SecretString>,
    pub max_new_tokens: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_new_tokens", &self.max_new_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HF_API_URL.to_string(),
            api_key: None,
            max_new_tokens: 300,
            timeout: Duration::from_secs(25),
        }
    }
}

/// Manual payment instructions shown to buyers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    pub card_number: Option<String>,
    pub card_owner: Option<String>,
    /// Price of one month of premium.
    pub price: Price,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            card_number: None,
            card_owner: None,
            price: Price::new(Decimal::new(2500, 0), CurrencyCode::KZT),
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the Telegram token or admin id is missing, or
    /// if any value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let telegram = TelegramConfig::from_env()?;
        let admin_id = admin_id_from_env()?;
        let host = parse_env("HOST", "0.0.0.0")?;
        let port = parse_env("PORT", "8080")?;
        let storage = StorageConfig::from_env();
        let generation = GenerationConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;
        let log_json = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            telegram,
            admin_id,
            host,
            port,
            storage,
            generation,
            payment,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the HTTP API.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token = get_optional_env("TELEGRAM_TOKEN")
            .or_else(|| get_optional_env("BOT_TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_TOKEN".to_string()))?;
        Ok(Self {
            token: SecretString::from(token),
        })
    }
}

impl GenerationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_key = get_optional_env("HF_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(|key| {
                if let Err(e) = validate_secret_strength(&key, "HF_API_KEY") {
                    tracing::warn!("HF_API_KEY validation warning: {e}");
                }
                SecretString::from(key)
            });
        let timeout_secs: u64 = parse_env("HF_TIMEOUT_SECS", "25")?;

        Ok(Self {
            api_url: get_optional_env("HF_API_URL").unwrap_or(defaults.api_url),
            api_key,
            max_new_tokens: parse_env("HF_MAX_NEW_TOKENS", "300")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let amount: Decimal = parse_env("PAYMENT_PRICE", "2500")?;
        let currency: CurrencyCode = parse_env("PAYMENT_CURRENCY", "KZT")?;
        Ok(Self {
            card_number: get_optional_env("PAYMENT_CARD_NUMBER"),
            card_owner: get_optional_env("PAYMENT_CARD_OWNER"),
            price: Price::new(amount, currency),
        })
    }
}

/// Load the admin identity.
///
/// # Errors
///
/// Returns `ConfigError` if `ADMIN_ID` is unset or not a valid user id.
pub fn admin_id_from_env() -> Result<UserId, ConfigError> {
    let _ = dotenvy::dotenv();
    get_required_env("ADMIN_ID")?
        .parse()
        .map_err(|e: lovesense_core::IdParseError| {
            ConfigError::InvalidEnvVar("ADMIN_ID".to_string(), e.to_string())
        })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
