//! Command-line interface definitions.
//!
//! Every option has a default matching the stock run, so the binary can be
//! invoked bare from a scheduler. Options can also be set through
//! environment variables.

use crate::config::{DEFAULT_OUTPUT_FILE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::normalize::NormalizePolicy;
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in channel list, output in the working directory
/// programtv_scrape
///
/// # Custom channel list, drop reruns, fetch four channels at a time
/// programtv_scrape -c channels.yaml --policy drop-reruns --concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the JSON file to write
    #[arg(short, long, env = "PROGRAMTV_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    pub output: String,

    /// Optional YAML channel list; the built-in list is used otherwise
    #[arg(short, long, env = "PROGRAMTV_CHANNELS")]
    pub channels: Option<String>,

    /// How listing text is cleaned up
    #[arg(long, value_enum, default_value_t = NormalizePolicy::CollapseDuplicates)]
    pub policy: NormalizePolicy,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Number of channels fetched at once (1 = sequential)
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}
