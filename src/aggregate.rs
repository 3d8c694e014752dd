//! Per-channel pipeline and whole-run aggregation.
//!
//! Every channel goes through fetch, extract and normalize independently.
//! Failures never cross channel boundaries: a channel that cannot be fetched,
//! or whose page has no schedule container, contributes an empty program list
//! and the run moves on. Only when every channel failed is the report
//! returned empty, so that the writer leaves any previous output in place.

use crate::config::ChannelConfig;
use crate::extractor::ScheduleLayout;
use crate::fetcher::Fetch;
use crate::models::{ChannelResult, ScheduleReport};
use crate::normalize::Normalizer;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

/// How a single channel fared.
#[derive(Debug)]
enum Outcome {
    Scraped(ChannelResult),
    Failed(ChannelResult),
}

impl Outcome {
    fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    fn into_result(self) -> ChannelResult {
        match self {
            Outcome::Scraped(result) | Outcome::Failed(result) => result,
        }
    }
}

/// The pieces a run needs, borrowed for its duration.
pub struct Aggregator<'a, F, L> {
    fetcher: &'a F,
    layout: &'a L,
    normalizer: Normalizer,
    concurrency: usize,
}

impl<'a, F, L> Aggregator<'a, F, L>
where
    F: Fetch,
    L: ScheduleLayout,
{
    /// `concurrency` of 1 processes channels strictly one after another.
    pub fn new(fetcher: &'a F, layout: &'a L, normalizer: Normalizer, concurrency: usize) -> Self {
        Self {
            fetcher,
            layout,
            normalizer,
            concurrency: concurrency.max(1),
        }
    }

    /// Scrape one channel. Problems are logged and yield an empty program list.
    #[instrument(level = "info", skip_all, fields(channel = %channel.name))]
    async fn run_channel(&self, channel: &ChannelConfig) -> Outcome {
        info!(url = %channel.url, "Scraping channel");

        let html = match self.fetcher.fetch(&channel.url).await {
            Ok(html) => html,
            Err(e) => {
                error!(channel = %channel.name, error = %e, "Error fetching channel");
                return Outcome::Failed(ChannelResult::empty(channel));
            }
        };

        let Some(rows) = self.layout.rows(&html) else {
            warn!(channel = %channel.name, "Could not find schedule container");
            debug!(preview = %truncate_for_log(&html, 300), "Page without schedule");
            return Outcome::Failed(ChannelResult::empty(channel));
        };

        let program = self.normalizer.normalize_all(&rows);
        info!(rows = rows.len(), entries = program.len(), "Channel scraped");
        Outcome::Scraped(ChannelResult::new(channel, program))
    }

    /// Scrape every channel, keeping configuration order in the report.
    ///
    /// Up to `concurrency` channels are in flight at once; results are
    /// collected in the order of `channels` regardless of completion order.
    ///
    /// # Arguments
    ///
    /// * `channels` - Channels to scrape, in output order
    ///
    /// # Returns
    ///
    /// A [`ScheduleReport`] with one [`ChannelResult`] per channel, failed
    /// channels carrying an empty program list. The report is empty when no
    /// channel could be fetched and parsed.
    #[instrument(level = "info", skip_all, fields(channels = channels.len(), concurrency = self.concurrency))]
    pub async fn scrape_all(&self, channels: &[ChannelConfig]) -> ScheduleReport {
        let outcomes: Vec<Outcome> = stream::iter(channels)
            .map(|channel| self.run_channel(channel))
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        if failed == outcomes.len() {
            warn!(failed, "No channel could be scraped");
            return ScheduleReport::default();
        }

        let report: ScheduleReport = outcomes
            .into_iter()
            .map(Outcome::into_result)
            .collect::<Vec<_>>()
            .into();
        info!(
            channels = report.len(),
            failed,
            entries = report.entry_count(),
            "Completed scraping"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelId;
    use crate::extractor::ProgramTvLayout;
    use crate::fetcher::{FetchError, HttpFetcher};
    use crate::normalize::NormalizePolicy;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Canned responses keyed by URL; unknown URLs fail with a 404.
    struct MockFetcher {
        pages: HashMap<String, String>,
        delays: HashMap<String, Duration>,
    }

    impl MockFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    impl Fetch for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.pages.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    /// Local HTTP server: `/slow` never answers, any other path gets `body`.
    async fn serve(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle(socket, body));
            }
        });
        format!("http://{addr}")
    }

    async fn handle(mut socket: TcpStream, body: &'static str) {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = String::from_utf8_lossy(&request);
        let path = head.split_whitespace().nth(1).unwrap_or("/");
        if path == "/slow" {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    const HBO_PAGE: &str = r#"
<div class="background-white">
  <div class="d-flex justify-content-start">
    <p class="px-3 pt-2 fw-bold">20:00</p><h2>Pasagerii - Pasagerii</h2>
  </div>
  <div class="d-flex justify-content-start">
    <p class="px-3 pt-2 fw-bold">21:30</p><h2>Meciul Zilei</h2><span class="tv-show-live">LIVE</span>
  </div>
  <div class="d-flex justify-content-start"><p class="px-3 pt-2 fw-bold">22:00</p></div>
</div>"#;

    const TVR_PAGE: &str = r#"
<div class="background-white">
  <div class="d-flex justify-content-start">
    <p class="px-3 pt-2 fw-bold">06:00</p><h2>Telejurnal 👉 Vezi detalii</h2>
  </div>
</div>"#;

    const BROKEN_PAGE: &str = "<html><body><p>Pagina nu există</p></body></html>";

    fn channels() -> Vec<ChannelConfig> {
        vec![
            ChannelConfig::new("HBO", "https://tv.test/hbo", Some(ChannelId::Number(20))),
            ChannelConfig::new("Offline", "https://tv.test/offline", None),
            ChannelConfig::new("Broken", "https://tv.test/broken", None),
            ChannelConfig::new("TVR3", "https://tv.test/tvr-3", Some(ChannelId::Text("03".into()))),
        ]
    }

    fn fetcher() -> MockFetcher {
        MockFetcher::new(&[
            ("https://tv.test/hbo", HBO_PAGE),
            ("https://tv.test/broken", BROKEN_PAGE),
            ("https://tv.test/tvr-3", TVR_PAGE),
        ])
    }

    #[tokio::test]
    async fn test_scrape_all_degrades_per_channel() {
        let fetcher = fetcher();
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 1);
        let report = aggregator.scrape_all(&channels()).await;

        let names: Vec<_> = report.channels.iter().map(|c| c.tv_channel.as_str()).collect();
        assert_eq!(names, vec!["HBO", "Offline", "Broken", "TVR3"]);

        assert_eq!(
            report.channels[0].tv_program,
            vec!["20:00 - Pasagerii", "21:30 - Meciul Zilei (LIVE)"]
        );
        assert_eq!(report.channels[0].id, Some(ChannelId::Number(20)));
        assert!(report.channels[1].tv_program.is_empty());
        assert!(report.channels[2].tv_program.is_empty());
        assert_eq!(report.channels[3].tv_program, vec!["06:00 - Telejurnal"]);
    }

    #[tokio::test]
    async fn test_timed_out_channel_gets_empty_program() {
        let base = serve(HBO_PAGE).await;
        let channels = vec![
            ChannelConfig::new("HBO", &format!("{base}/hbo"), Some(ChannelId::Number(20))),
            ChannelConfig::new("Slow", &format!("{base}/slow"), None),
            ChannelConfig::new("HBO2", &format!("{base}/hbo-2"), Some(ChannelId::Number(21))),
        ];
        let fetcher = HttpFetcher::new("test-agent", Duration::from_millis(200)).unwrap();
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 1);
        let report = aggregator.scrape_all(&channels).await;

        let names: Vec<_> = report.channels.iter().map(|c| c.tv_channel.as_str()).collect();
        assert_eq!(names, vec!["HBO", "Slow", "HBO2"]);
        assert!(report.channels[1].tv_program.is_empty());
        for i in [0, 2] {
            assert_eq!(
                report.channels[i].tv_program,
                vec!["20:00 - Pasagerii", "21:30 - Meciul Zilei (LIVE)"]
            );
        }
    }

    #[tokio::test]
    async fn test_drop_reruns_policy_applied() {
        let fetcher = fetcher();
        let aggregator = Aggregator::new(
            &fetcher,
            &ProgramTvLayout,
            Normalizer::new(NormalizePolicy::DropReruns),
            1,
        );
        let report = aggregator.scrape_all(&channels()).await;
        assert!(report.channels[3].tv_program.is_empty());
        assert_eq!(
            report.channels[0].tv_program,
            vec!["20:00 - Pasagerii - Pasagerii", "21:30 - Meciul Zilei (LIVE)"]
        );
    }

    #[tokio::test]
    async fn test_parallel_scrape_keeps_config_order() {
        let fetcher = fetcher().with_delay("https://tv.test/hbo", Duration::from_millis(50));
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 4);
        let report = aggregator.scrape_all(&channels()).await;

        let names: Vec<_> = report.channels.iter().map(|c| c.tv_channel.as_str()).collect();
        assert_eq!(names, vec!["HBO", "Offline", "Broken", "TVR3"]);
        assert_eq!(report.channels[0].tv_program.len(), 2);
    }

    #[tokio::test]
    async fn test_all_channels_failing_gives_empty_report() {
        let fetcher = MockFetcher::new(&[("https://tv.test/broken", BROKEN_PAGE)]);
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 0);
        let report = aggregator.scrape_all(&channels()).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_channel_without_listings_still_counts() {
        let fetcher = MockFetcher::new(&[(
            "https://tv.test/hbo",
            r#"<div class="background-white"></div>"#,
        )]);
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 1);
        let report = aggregator.scrape_all(&channels()).await;
        assert_eq!(report.len(), 4);
        assert_eq!(report.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_scrape_single_channel() {
        let fetcher = fetcher();
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 1);
        let result = aggregator.run_channel(&channels()[3]).await.into_result();
        assert_eq!(result.tv_channel, "TVR3");
        assert_eq!(result.id, Some(ChannelId::Text("03".into())));
        assert_eq!(result.tv_program, vec!["06:00 - Telejurnal"]);

        let offline = aggregator.run_channel(&channels()[1]).await;
        assert!(offline.is_failed());
        let offline = offline.into_result();
        assert!(offline.tv_program.is_empty());
    }

    #[tokio::test]
    async fn test_no_channels_gives_empty_report() {
        let fetcher = fetcher();
        let aggregator = Aggregator::new(&fetcher, &ProgramTvLayout, Normalizer::default(), 1);
        assert!(aggregator.scrape_all(&[]).await.is_empty());
    }
}
