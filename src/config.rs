//! Channel configuration.
//!
//! A run is driven by an ordered list of [`ChannelConfig`] values. The list
//! either comes from the built-in table ([`default_channels`]) or from a YAML
//! file passed on the command line:
//!
//! ```yaml
//! - name: HBO
//!   url: https://programtv.ro/canal-tv/hbo
//!   id: 20
//! - name: Pro TV
//!   url: https://programtv.ro/canal-tv/pro-tv
//!   id: "07"
//! ```
//!
//! The list is validated once at startup and never mutated afterwards.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tracing::{info, instrument};
use url::Url;

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Request timeout bound, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default output file name.
pub const DEFAULT_OUTPUT_FILE: &str = "programtv_schedule.json";

/// Identifier attached to a channel in the output.
///
/// Some consumers expect a small integer, others a zero-padded string such
/// as `"07"`; both are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Number(u32),
    Text(String),
}

/// A single channel to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display name; unique within a channel list.
    pub name: String,
    /// Channel page on programtv.ro.
    pub url: String,
    /// Optional identifier copied into the output record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChannelId>,
}

impl ChannelConfig {
    pub fn new(name: &str, url: &str, id: Option<ChannelId>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            id,
        }
    }
}

/// Reasons a channel list is rejected.
#[derive(Debug)]
pub enum ConfigError {
    Empty,
    DuplicateName(String),
    InvalidUrl { channel: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Empty => write!(f, "channel list is empty"),
            ConfigError::DuplicateName(name) => write!(f, "duplicate channel name: {name}"),
            ConfigError::InvalidUrl { channel, reason } => {
                write!(f, "invalid URL for channel {channel}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// The built-in channel table.
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("HBO", "https://programtv.ro/canal-tv/hbo", Some(ChannelId::Number(20))),
        ChannelConfig::new("HBO2", "https://programtv.ro/canal-tv/hbo-2", Some(ChannelId::Number(21))),
        ChannelConfig::new("Pro TV", "https://programtv.ro/canal-tv/pro-tv", None),
        ChannelConfig::new("Antena 1", "https://programtv.ro/canal-tv/antena-1", None),
        ChannelConfig::new("Digi24 HD", "https://programtv.ro/canal-tv/digi-24", None),
        ChannelConfig::new("FilmNow", "https://programtv.ro/canal-tv/film-now", None),
        ChannelConfig::new("TVR3", "https://programtv.ro/canal-tv/tvr-3", None),
        ChannelConfig::new("BBC Earth", "https://programtv.ro/canal-tv/bbc-earth", None),
        ChannelConfig::new("Cartoon Network", "https://programtv.ro/canal-tv/cartoon-network", None),
        ChannelConfig::new("Kanal D", "https://programtv.ro/canal-tv/kanal-d-", None),
    ]
}

/// Parse a YAML channel list.
pub fn parse_channels(yaml: &str) -> Result<Vec<ChannelConfig>, Box<dyn Error>> {
    let channels: Vec<ChannelConfig> = serde_yaml::from_str(yaml)?;
    validate_channels(&channels)?;
    Ok(channels)
}

/// Load the channel list from `path`, or fall back to the built-in table.
///
/// # Arguments
///
/// * `path` - Optional path to a YAML channel file
///
/// # Returns
///
/// The validated channels in configured order, or an error if the file
/// cannot be read, is not valid YAML, or fails [`validate_channels`].
#[instrument(level = "info")]
pub async fn load_channels(path: Option<&str>) -> Result<Vec<ChannelConfig>, Box<dyn Error>> {
    let channels = match path {
        Some(path) => {
            let yaml = tokio::fs::read_to_string(path).await?;
            parse_channels(&yaml)?
        }
        None => {
            let channels = default_channels();
            validate_channels(&channels)?;
            channels
        }
    };
    info!(count = channels.len(), "Loaded channel list");
    Ok(channels)
}

/// Check that the list is non-empty, names are unique and URLs are absolute http(s).
pub fn validate_channels(channels: &[ChannelConfig]) -> Result<(), ConfigError> {
    if channels.is_empty() {
        return Err(ConfigError::Empty);
    }

    if let Some(dup) = channels.iter().map(|c| c.name.as_str()).duplicates().next() {
        return Err(ConfigError::DuplicateName(dup.to_string()));
    }

    for channel in channels {
        let parsed = Url::parse(&channel.url).map_err(|e| ConfigError::InvalidUrl {
            channel: channel.name.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                channel: channel.name.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
    }

    Ok(())
}
