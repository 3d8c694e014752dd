//! Schedule extraction from channel pages.
//!
//! A programtv.ro channel page keeps the day's listings inside a white
//! content panel. Each program slot is a flex row holding a bold time label,
//! an `<h2>` title and, for the program currently airing, a live badge:
//!
//! ```html
//! <div class="background-white">
//!   <div class="d-flex justify-content-start">
//!     <p class="px-3 pt-2 fw-bold">21:30</p>
//!     <div><h2>Meciul Zilei</h2><span class="tv-show-live">LIVE</span></div>
//!   </div>
//! </div>
//! ```
//!
//! Selection rules live behind [`ScheduleLayout`] so they can be exercised
//! against fixed fixtures and swapped if the site markup changes.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.background-white").expect("valid container selector"));
static ROW: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.d-flex.justify-content-start").expect("valid row selector")
});
static TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.px-3.pt-2.fw-bold").expect("valid time selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("valid title selector"));
static LIVE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.tv-show-live").expect("valid live selector"));

/// One listing row as found on the page, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Broadcast time, e.g. `"20:00"`. Empty when the row has no time label.
    pub time: String,
    /// Program title. Never empty for rows returned by a layout.
    pub title: String,
    /// Live badge text, `None` when the program is not airing.
    pub live: Option<String>,
}

#[cfg(test)]
impl RawEntry {
    pub fn new(time: &str, title: &str, live: Option<&str>) -> Self {
        Self {
            time: time.to_string(),
            title: title.to_string(),
            live: live.map(str::to_string),
        }
    }
}

/// Given a document, return its schedule rows.
pub trait ScheduleLayout {
    /// `None` when the page has no schedule container; otherwise the rows
    /// with a non-empty title, in page order.
    fn rows(&self, html: &str) -> Option<Vec<RawEntry>>;
}

/// Markup rules for programtv.ro channel pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramTvLayout;

impl ScheduleLayout for ProgramTvLayout {
    fn rows(&self, html: &str) -> Option<Vec<RawEntry>> {
        let document = Html::parse_document(html);
        let container = document.select(&CONTAINER).next()?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for row in container.select(&ROW) {
            if is_nested_row(row, container) {
                continue;
            }
            match parse_row(row) {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        debug!(rows = entries.len(), skipped, "Extracted schedule rows");
        Some(entries)
    }
}

/// A row inside another row belongs to its parent's slot.
fn is_nested_row(row: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.id() != container.id())
        .any(|ancestor| ROW.matches(&ancestor))
}

fn parse_row(row: ElementRef<'_>) -> Option<RawEntry> {
    let title = row
        .select(&TITLE)
        .next()
        .map(|el| joined_text(el, " "))
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let time = row
        .select(&TIME)
        .next()
        .map(|el| joined_text(el, ""))
        .unwrap_or_default();
    let live = row.select(&LIVE).next().map(|el| joined_text(el, ""));

    Some(RawEntry { time, title, live })
}

/// Text fragments of `el`, each trimmed, empty ones skipped, joined by `sep`.
fn joined_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .join(sep)
}
