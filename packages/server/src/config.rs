use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domains::moderation::models::{McodeSize, DEFAULT_MCODE_LENGTH};

const DEFAULT_RECORD_TTL_SECS: u64 = 3600;
const DEFAULT_REPORT_TTL_SECS: u64 = 600;
const DEFAULT_NOTIFICATION_SENDER: &str = "noreply@blog.local";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Length of generated moderation codes, always one of the supported presets.
    pub moderation_code_length: usize,
    /// Lifetime of a moderation record, both its expiry and its cache TTL.
    pub record_ttl: Duration,
    /// Lifetime of the free-text report kept per judged block.
    pub report_ttl: Duration,
    pub notification_sender: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let code_length: usize = parse_var("MODERATION_CODE_LENGTH", DEFAULT_MCODE_LENGTH)?;

        Ok(Self {
            moderation_code_length: clamp_code_length(code_length),
            record_ttl: Duration::from_secs(parse_var(
                "MODERATION_RECORD_TTL_SECS",
                DEFAULT_RECORD_TTL_SECS,
            )?),
            report_ttl: Duration::from_secs(parse_var(
                "MODERATION_REPORT_TTL_SECS",
                DEFAULT_REPORT_TTL_SECS,
            )?),
            notification_sender: env::var("NOTIFICATION_SENDER")
                .unwrap_or_else(|_| DEFAULT_NOTIFICATION_SENDER.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moderation_code_length: DEFAULT_MCODE_LENGTH,
            record_ttl: Duration::from_secs(DEFAULT_RECORD_TTL_SECS),
            report_ttl: Duration::from_secs(DEFAULT_REPORT_TTL_SECS),
            notification_sender: DEFAULT_NOTIFICATION_SENDER.to_string(),
        }
    }
}

/// Round up to the nearest supported preset; out-of-range lengths fall back
/// to the default.
fn clamp_code_length(length: usize) -> usize {
    if length == 0 || length > McodeSize::Max.len() {
        DEFAULT_MCODE_LENGTH
    } else {
        McodeSize::fitting(length).len()
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}
