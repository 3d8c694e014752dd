//! JSON output of the schedule report.
//!
//! The file is a JSON array of channel objects, indented by four spaces with
//! non-ASCII characters written literally:
//!
//! ```json
//! [
//!     {
//!         "id": 20,
//!         "tv_channel": "HBO",
//!         "tv_program": [
//!             "20:00 - Pasagerii"
//!         ]
//!     }
//! ]
//! ```
//!
//! The target is replaced whole: the report is written to a sibling temp
//! file, then renamed over it. An empty report writes nothing.

use crate::models::ScheduleReport;
use crate::utils::ensure_parent_dir;
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Serialize `report` with four-space indentation.
pub fn to_pretty_json(report: &ScheduleReport) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    report.serialize(&mut ser)?;
    Ok(buf)
}

/// Sibling temp file, unique per process so concurrent runs never share one.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Write a [`ScheduleReport`] to a JSON file, replacing it whole.
///
/// The report is serialized, written to a sibling temp file and renamed over
/// `path`. Missing parent directories are created. On failure the temp file
/// is removed and any previous file at `path` is left as it was.
///
/// # Arguments
///
/// * `report` - The channels to serialize, in output order
/// * `path` - Target file, usually `programtv_schedule.json`
///
/// # Returns
///
/// `Ok(false)` without touching the file system when the report is empty,
/// `Ok(true)` once the file has been replaced, or an error if serialization,
/// writing or renaming fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &ScheduleReport, path: &Path) -> Result<bool, Box<dyn Error>> {
    if report.is_empty() {
        warn!("No data to save");
        return Ok(false);
    }

    let json = to_pretty_json(report)?;
    ensure_parent_dir(path).await?;

    let tmp = temp_path_for(path);
    if let Err(e) = fs::write(&tmp, &json).await {
        error!(tmp = %tmp.display(), error = %e, "Failed to write JSON");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        error!(tmp = %tmp.display(), error = %e, "Failed to move JSON into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!(
        channels = report.len(),
        bytes = json.len(),
        "Saved schedule for {} channels to {}",
        report.len(),
        path.display()
    );
    Ok(true)
}
