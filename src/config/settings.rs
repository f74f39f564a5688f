use serde::Deserialize;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CHAT_ID: &str = "-4891438477";
pub const DEFAULT_RSS_URL: &str = "https://news.google.com/rss/search?q=crypto+OR+bitcoin+OR+ethereum+war+OR+SEC+OR+ETF+OR+inflation+OR+hack&hl=en-US&gl=US&ceid=US:en";
pub const DEFAULT_CHECK_INTERVAL_SEC: u64 = 300;
pub const DEFAULT_MODEL_ID: &str = "google/flan-t5-small";
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";
pub const DEFAULT_HTTP_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_INFERENCE_TIMEOUT_SEC: u64 = 120;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// 推送策略: `critical` 只推送严重利空，`all` 把每条模型输出原样转发
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    Critical,
    All,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid RSS_URL '{url}': {reason}")]
    InvalidFeedUrl { url: String, reason: String },

    #[error("CHECK_INTERVAL must be at least 1 second")]
    ZeroInterval,

    #[error("{0} must be at least 1 second")]
    ZeroTimeout(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotSettings {
    pub huggingface_token: String,
    pub telegram_bot_token: String,
    pub chat_id: String,
    pub rss_url: String,
    pub check_interval: u64,
    pub hf_model_id: String,
    pub hf_inference_url: String,
    pub telegram_api_url: String,
    pub telegram_markdown: bool,
    pub alert_mode: AlertMode,
    pub skip_failed_articles: bool,
    pub http_timeout_sec: u64,
    pub inference_timeout_sec: u64,
}

impl BotSettings {
    /// 优先级: 环境变量 (含 .env) > bot_config 文件 > 内置默认值
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_with(Environment::default())
    }

    /// 环境变量名 (HUGGINGFACE_TOKEN) 由 config 转成小写键 (huggingface_token)
    pub fn load_with(env: Environment) -> Result<Self, SettingsError> {
        let settings = Self::defaults()?
            .add_source(File::with_name("bot_config").required(false))
            .add_source(env)
            .build()?;

        Self::from_config(settings)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        let builder = Config::builder()
            .set_default("huggingface_token", "")?
            .set_default("telegram_bot_token", "")?
            .set_default("chat_id", DEFAULT_CHAT_ID)?
            .set_default("rss_url", DEFAULT_RSS_URL)?
            .set_default("check_interval", DEFAULT_CHECK_INTERVAL_SEC)?
            .set_default("hf_model_id", DEFAULT_MODEL_ID)?
            .set_default("hf_inference_url", DEFAULT_INFERENCE_URL)?
            .set_default("telegram_api_url", DEFAULT_TELEGRAM_API_URL)?
            .set_default("telegram_markdown", false)?
            .set_default("alert_mode", "critical")?
            .set_default("skip_failed_articles", false)?
            .set_default("http_timeout_sec", DEFAULT_HTTP_TIMEOUT_SEC)?
            .set_default("inference_timeout_sec", DEFAULT_INFERENCE_TIMEOUT_SEC)?;
        Ok(builder)
    }

    pub fn from_config(settings: Config) -> Result<Self, SettingsError> {
        let parsed: BotSettings = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.huggingface_token.trim().is_empty() {
            return Err(SettingsError::MissingCredential("HUGGINGFACE_TOKEN"));
        }
        if self.telegram_bot_token.trim().is_empty() {
            return Err(SettingsError::MissingCredential("TELEGRAM_BOT_TOKEN"));
        }
        if let Err(e) = Url::parse(&self.rss_url) {
            return Err(SettingsError::InvalidFeedUrl {
                url: self.rss_url.clone(),
                reason: e.to_string(),
            });
        }
        if self.check_interval == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        if self.http_timeout_sec == 0 {
            return Err(SettingsError::ZeroTimeout("HTTP_TIMEOUT_SEC"));
        }
        if self.inference_timeout_sec == 0 {
            return Err(SettingsError::ZeroTimeout("INFERENCE_TIMEOUT_SEC"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }
}
