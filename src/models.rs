//! Output records.
//!
//! - [`ChannelResult`]: the normalized schedule of one channel
//! - [`ScheduleReport`]: every channel of a run, in configuration order
//!
//! Field names match the published JSON (`id`, `tv_channel`, `tv_program`),
//! and the field order here is the order written to disk.

use crate::config::{ChannelConfig, ChannelId};
use serde::{Deserialize, Serialize};

/// The schedule of a single channel for the current day.
///
/// `tv_program` holds flattened display strings such as
/// `"21:30 - Meciul Zilei (LIVE)"`, in on-page order. It is empty when the
/// channel could not be fetched or its page had no schedule container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    /// Identifier from the channel configuration, omitted when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChannelId>,
    /// Channel display name.
    pub tv_channel: String,
    /// Normalized program entries.
    pub tv_program: Vec<String>,
}

impl ChannelResult {
    /// A result with the given entries, labelled from `channel`.
    pub fn new(channel: &ChannelConfig, tv_program: Vec<String>) -> Self {
        Self {
            id: channel.id.clone(),
            tv_channel: channel.name.clone(),
            tv_program,
        }
    }

    /// A result with no entries, used when fetching or extraction failed.
    pub fn empty(channel: &ChannelConfig) -> Self {
        Self::new(channel, Vec::new())
    }
}

/// The full output of a run. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleReport {
    pub channels: Vec<ChannelResult>,
}

impl ScheduleReport {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Total number of program entries across all channels.
    pub fn entry_count(&self) -> usize {
        self.channels.iter().map(|c| c.tv_program.len()).sum()
    }
}

impl From<Vec<ChannelResult>> for ScheduleReport {
    fn from(channels: Vec<ChannelResult>) -> Self {
        Self { channels }
    }
}
