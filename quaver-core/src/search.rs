use serde::Deserialize;
use url::Url;

use crate::{error::Error, track::Track, util};

/// Maximum number of candidates a search returns.
pub const SEARCH_LIMIT: usize = 5;

/// External service that turns a free-form query into playable track
/// candidates.
pub trait SearchService {
    /// Returns up to [`SEARCH_LIMIT`] candidates, best match first.  An
    /// empty result is a valid answer, not an error.
    fn search(&self, query: &str) -> Result<Vec<Track>, Error>;
}

/// Search backed by an Invidious-compatible JSON API.
pub struct HttpSearch {
    agent: ureq::Agent,
    api_base: String,
}

impl HttpSearch {
    pub fn new(api_base: &str, proxy_url: Option<&str>) -> Self {
        Self {
            agent: util::default_ureq_agent_builder(proxy_url).build().into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl SearchService for HttpSearch {
    fn search(&self, query: &str) -> Result<Vec<Track>, Error> {
        let mut uri = Url::parse(&format!("{}/api/v1/search", self.api_base))
            .map_err(|err| Error::SearchFailed(Box::new(err)))?;
        uri.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", "video");

        let mut response = self
            .agent
            .get(uri.as_str())
            .call()
            .map_err(|err| Error::SearchFailed(Box::new(err)))?;
        let entries: Vec<SearchEntry> = response
            .body_mut()
            .read_json()
            .map_err(|err| Error::SearchFailed(Box::new(err)))?;

        log::debug!("search for {:?} returned {} entries", query, entries.len());
        Ok(candidates(entries))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    length_seconds: u64,
}

/// Turns raw API entries into track candidates, skipping entries without a
/// usable video ID or title and capping the list at [`SEARCH_LIMIT`].
fn candidates(entries: Vec<SearchEntry>) -> Vec<Track> {
    entries
        .into_iter()
        .filter(|entry| !entry.video_id.is_empty() && !entry.title.is_empty())
        .take(SEARCH_LIMIT)
        .map(|entry| {
            Track::new(
                entry.title,
                watch_link(&entry.video_id),
                util::format_duration(entry.length_seconds),
            )
        })
        .collect()
}

fn watch_link(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
