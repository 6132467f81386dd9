use std::time::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const USER_CONFIG: &str = "~/.config/route53-pager/config";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,

    /// Open one transport up front and share it across calls.
    #[serde(default)]
    pub reuse_transport: bool,
    pub page_size: Option<i32>,
    pub requests_per_second: Option<u64>,

    #[serde(default = "default_poll_interval")]
    pub change_poll_interval: String,
    #[serde(default = "default_change_timeout")]
    pub change_timeout: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_poll_interval() -> String {
    "5s".to_owned()
}

fn default_change_timeout() -> String {
    "5m".to_owned()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let user_config = shellexpand::tilde(USER_CONFIG);

        Self::from_config(Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&user_config).required(false))
            .add_source(Environment::with_prefix("ROUTE53_PAGER").try_parsing(true))
            .build()?)
    }

    pub fn from_config(cfg: Config) -> Result<Self, ConfigError> {
        cfg.try_deserialize()
    }

    pub fn change_poll_interval(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.change_poll_interval)
    }

    pub fn change_timeout(&self) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(&self.change_timeout)
    }
}
