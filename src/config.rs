//! Bot configuration.
//!
//! All runtime settings come from environment variables with sensible
//! defaults; credentials have no defaults and must be provided. Validation
//! normalizes out-of-range values rather than failing where the original
//! operator workflow expects a silent reset (the QR size percentage).

use std::time::Duration;
use thiserror::Error;

/// Valid range for the QR max-size percentage.
pub const QR_SIZE_PERCENTAGE_RANGE: (f64, f64) = (5.0, 50.0);

/// Percentage applied when the configured value falls outside the range.
pub const QR_SIZE_PERCENTAGE_DEFAULT: f64 = 20.0;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Sizing constraints for the QR overlay composition.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Longest side the source image is allowed to keep; larger images are
    /// downscaled to fit (never upscaled).
    pub max_image_dimension: u32,
    /// Pixels per QR module when the code is first rendered.
    pub qr_module_pixel_size: u32,
    /// Inward offset from the bottom-right corner, in pixels.
    pub qr_padding: u32,
    /// QR side as a percentage of the image's smaller dimension.
    /// Valid range is [5, 50]; out-of-range values reset to 20.
    pub qr_max_size_percentage: f64,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 4000,
            qr_module_pixel_size: 20,
            qr_padding: 20,
            qr_max_size_percentage: QR_SIZE_PERCENTAGE_DEFAULT,
        }
    }
}

impl ComposeConfig {
    /// Returns the percentage to actually use, resetting out-of-range
    /// values to the default with a warning.
    pub fn effective_qr_percentage(&self) -> f64 {
        let (min, max) = QR_SIZE_PERCENTAGE_RANGE;
        if self.qr_max_size_percentage < min || self.qr_max_size_percentage > max {
            tracing::warn!(
                configured = self.qr_max_size_percentage,
                fallback = QR_SIZE_PERCENTAGE_DEFAULT,
                "QR max size percentage out of [{min}, {max}], using default"
            );
            QR_SIZE_PERCENTAGE_DEFAULT
        } else {
            self.qr_max_size_percentage
        }
    }
}

/// Configuration for the whole bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    // NASA APOD source
    /// Base URL of the APOD endpoint.
    pub nasa_api_url: String,
    /// NASA API key.
    pub nasa_api_key: String,

    // Telegram sink
    /// Bot token used for the sendPhoto call.
    pub telegram_bot_token: String,
    /// Target channel in `@name` form.
    pub telegram_channel_id: String,

    // OpenAI Assistants translation backend
    /// Base URL of the Assistants API.
    pub openai_api_url: String,
    /// OpenAI API key.
    pub openai_api_key: String,
    /// Assistant configured to translate captions.
    pub openai_assistant_id: String,

    // Composition
    /// QR overlay sizing constraints.
    pub compose: ComposeConfig,

    // Translation polling
    /// Delay between run status polls.
    pub translation_poll_interval: Duration,
    /// Wall-clock deadline for a run, measured from run start.
    pub translation_max_wait: Duration,

    // Scheduling
    /// Daily posting time, UTC, in HH:MM form.
    pub post_time_utc: String,
    /// Target language code for caption translation.
    pub target_language: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nasa_api_url: "https://api.nasa.gov/planetary/apod".to_string(),
            nasa_api_key: String::new(),
            telegram_bot_token: String::new(),
            telegram_channel_id: String::new(),
            openai_api_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: String::new(),
            openai_assistant_id: String::new(),
            compose: ComposeConfig::default(),
            translation_poll_interval: Duration::from_secs(1),
            translation_max_wait: Duration::from_secs(30),
            post_time_utc: "12:10".to_string(),
            target_language: "ru".to_string(),
        }
    }
}

impl BotConfig {
    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NASA_API_URL`: APOD endpoint (default: https://api.nasa.gov/planetary/apod)
    /// - `NASA_API_KEY`: NASA API key (required)
    /// - `TELEGRAM_BOT_TOKEN`: bot token (required)
    /// - `TELEGRAM_CHANNEL_ID`: channel id in `@name` form (required)
    /// - `OPENAI_API_URL`: Assistants API base (default: https://api.openai.com/v1)
    /// - `OPENAI_API_KEY`: OpenAI API key (required)
    /// - `OPENAI_ASSISTANT_ID`: translation assistant id (required)
    /// - `BOT_MAX_IMAGE_DIMENSION`: longest allowed image side (default: 4000)
    /// - `BOT_QR_MODULE_SIZE`: QR pixels per module (default: 20)
    /// - `BOT_QR_PADDING`: corner padding in pixels (default: 20)
    /// - `BOT_QR_MAX_SIZE_PERCENTAGE`: QR size percentage (default: 20.0)
    /// - `BOT_TRANSLATION_POLL_INTERVAL_SECS`: poll interval (default: 1)
    /// - `BOT_TRANSLATION_MAX_WAIT_SECS`: run deadline (default: 30)
    /// - `BOT_POST_TIME_UTC`: daily posting time HH:MM (default: 12:10)
    /// - `BOT_TARGET_LANGUAGE`: caption language code (default: ru)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or have
    /// invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NASA_API_URL") {
            config.nasa_api_url = val;
        }
        config.nasa_api_key = require_env("NASA_API_KEY")?;

        config.telegram_bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
        config.telegram_channel_id = require_env("TELEGRAM_CHANNEL_ID")?;

        if let Ok(val) = std::env::var("OPENAI_API_URL") {
            config.openai_api_url = val;
        }
        config.openai_api_key = require_env("OPENAI_API_KEY")?;
        config.openai_assistant_id = require_env("OPENAI_ASSISTANT_ID")?;

        if let Ok(val) = std::env::var("BOT_MAX_IMAGE_DIMENSION") {
            config.compose.max_image_dimension =
                parse_env_value(&val, "BOT_MAX_IMAGE_DIMENSION")?;
        }

        if let Ok(val) = std::env::var("BOT_QR_MODULE_SIZE") {
            config.compose.qr_module_pixel_size = parse_env_value(&val, "BOT_QR_MODULE_SIZE")?;
        }

        if let Ok(val) = std::env::var("BOT_QR_PADDING") {
            config.compose.qr_padding = parse_env_value(&val, "BOT_QR_PADDING")?;
        }

        if let Ok(val) = std::env::var("BOT_QR_MAX_SIZE_PERCENTAGE") {
            config.compose.qr_max_size_percentage =
                parse_env_value(&val, "BOT_QR_MAX_SIZE_PERCENTAGE")?;
        }

        if let Ok(val) = std::env::var("BOT_TRANSLATION_POLL_INTERVAL_SECS") {
            let secs: u64 = parse_env_value(&val, "BOT_TRANSLATION_POLL_INTERVAL_SECS")?;
            config.translation_poll_interval = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("BOT_TRANSLATION_MAX_WAIT_SECS") {
            let secs: u64 = parse_env_value(&val, "BOT_TRANSLATION_MAX_WAIT_SECS")?;
            config.translation_max_wait = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("BOT_POST_TIME_UTC") {
            config.post_time_utc = val;
        }

        if let Ok(val) = std::env::var("BOT_TARGET_LANGUAGE") {
            config.target_language = val;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates and normalizes the configuration.
    ///
    /// The QR size percentage is clamped back to its default when out of
    /// range (logged as a warning, not an error). Everything else that is
    /// malformed fails validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let (min, max) = QR_SIZE_PERCENTAGE_RANGE;
        if self.compose.qr_max_size_percentage < min || self.compose.qr_max_size_percentage > max
        {
            tracing::warn!(
                configured = self.compose.qr_max_size_percentage,
                fallback = QR_SIZE_PERCENTAGE_DEFAULT,
                "QR max size percentage out of [{min}, {max}], resetting to default"
            );
            self.compose.qr_max_size_percentage = QR_SIZE_PERCENTAGE_DEFAULT;
        }

        if self.compose.max_image_dimension == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_image_dimension must be greater than 0".to_string(),
            ));
        }

        if self.compose.qr_module_pixel_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "qr_module_pixel_size must be greater than 0".to_string(),
            ));
        }

        if self.translation_poll_interval.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "translation_poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.translation_max_wait.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "translation_max_wait must be greater than 0".to_string(),
            ));
        }

        if crate::scheduler::parse_post_time(&self.post_time_utc).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "post_time_utc '{}' is not a valid HH:MM time",
                self.post_time_utc
            )));
        }

        Ok(())
    }

    /// Public link encoded into the QR code: `https://t.me/<channel>`.
    pub fn channel_link(&self) -> String {
        let name = self.telegram_channel_id.trim_start_matches('@');
        format!("https://t.me/{name}")
    }
}

/// Requires an environment variable to be set and non-empty.
fn require_env(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
