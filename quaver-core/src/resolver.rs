use serde::Deserialize;
use url::Url;

use crate::{error::Error, util};

/// A playable stream location, produced by a [`StreamResolver`] and consumed
/// by the media engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    pub url: String,
}

/// External service that turns an opaque track link into a playable stream
/// endpoint.
pub trait StreamResolver {
    /// Fails with a resolution error on network or parse problems.  Never
    /// mutates caller state on failure.
    fn resolve(&self, link: &str) -> Result<StreamEndpoint, Error>;
}

/// Resolver backed by an Invidious-compatible JSON API.
pub struct HttpResolver {
    agent: ureq::Agent,
    api_base: String,
}

impl HttpResolver {
    pub fn new(api_base: &str, proxy_url: Option<&str>) -> Self {
        Self {
            agent: util::default_ureq_agent_builder(proxy_url).build().into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl StreamResolver for HttpResolver {
    fn resolve(&self, link: &str) -> Result<StreamEndpoint, Error> {
        let video_id =
            video_id_from_link(link).ok_or_else(|| Error::BadTrackLink(link.to_string()))?;
        let uri = format!("{}/api/v1/videos/{}", self.api_base, video_id);
        let mut response = self
            .agent
            .get(uri)
            .call()
            .map_err(|err| Error::ResolveFailed(Box::new(err)))?;
        let video: VideoFormats = response
            .body_mut()
            .read_json()
            .map_err(|err| Error::ResolveFailed(Box::new(err)))?;

        let format = best_audio_format(&video.adaptive_formats).ok_or(Error::NoAudioStream)?;
        log::debug!("resolved {} to a {} stream", video_id, format.mime_type);
        Ok(StreamEndpoint {
            url: format.url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoFormats {
    #[serde(default)]
    adaptive_formats: Vec<AdaptiveFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdaptiveFormat {
    #[serde(default)]
    url: String,
    #[serde(default, rename = "type")]
    mime_type: String,
    /// The API serves the bitrate as a decimal string, not a number.
    #[serde(default)]
    bitrate: String,
}

/// Picks the `audio/*` format with the highest bitrate.
fn best_audio_format(formats: &[AdaptiveFormat]) -> Option<&AdaptiveFormat> {
    formats
        .iter()
        .filter(|format| format.mime_type.starts_with("audio/") && !format.url.is_empty())
        .max_by_key(|format| format.bitrate.parse::<u64>().unwrap_or(0))
}

/// Extracts the video ID from a track link.  Accepts watch URLs
/// (`?v=<id>`), short links (`youtu.be/<id>`), and bare IDs.
fn video_id_from_link(link: &str) -> Option<String> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => {
            // Not a URL at all, treat the whole link as a bare ID.
            return Some(link.trim().to_string()).filter(|id| !id.is_empty());
        }
    };
    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        return Some(id.into_owned());
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(str::to_string)
        .filter(|id| !id.is_empty())
}
