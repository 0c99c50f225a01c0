//! URL normalization
//!
//! Extracts the canonical [`ExternalId`] from any supported video URL shape:
//!
//! - `https://www.youtube.com/watch?v=<id>` (with any extra query parameters)
//! - `https://youtu.be/<id>`
//! - `https://www.youtube.com/embed/<id>`
//! - `https://www.youtube.com/v/<id>`
//! - `https://www.youtube.com/shorts/<id>`
//! - `https://www.youtube.com/user/<name>#p/u/<digit>/<id>`
//!
//! Pure and deterministic: no network access and no logging.

use url::Url;

use super::ExternalId;

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
];

const SHORT_LINK_HOST: &str = "youtu.be";

/// Path words that sit where an identifier would but name something else.
const RESERVED_PATH_WORDS: &[&str] = &["videoseries"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrl {
    #[error("URL is empty")]
    Empty,

    #[error("URL could not be parsed: {0}")]
    Malformed(String),

    #[error("URL host is not a supported video platform: {0}")]
    UnsupportedHost(String),

    #[error("URL does not reference a video: {0}")]
    MissingIdentifier(String),

    #[error("video identifier must be 11 characters of [A-Za-z0-9_-]: {0}")]
    BadIdentifier(String),
}

/// Extracts the canonical identifier, or fails with [`InvalidUrl`].
pub fn parse_video_url(raw: &str) -> Result<ExternalId, InvalidUrl> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrl::Empty);
    }

    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{trimmed}"))
            .map_err(|_| InvalidUrl::Malformed(trimmed.to_string()))?,
        Err(_) => return Err(InvalidUrl::Malformed(trimmed.to_string())),
    };
    let host = url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| InvalidUrl::Malformed(trimmed.to_string()))?;
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let candidate = if host == SHORT_LINK_HOST {
        path_segments(&url).first().map(|s| s.to_string())
    } else if YOUTUBE_HOSTS.contains(&host) {
        candidate_from_youtube(&url)
    } else {
        return Err(InvalidUrl::UnsupportedHost(host.to_string()));
    };

    match candidate {
        Some(token) => ExternalId::parse(&token),
        None => Err(InvalidUrl::MissingIdentifier(trimmed.to_string())),
    }
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn candidate_from_youtube(url: &Url) -> Option<String> {
    let segments = path_segments(url);
    if let Some(token) = candidate_from_segments(&segments) {
        return Some(token.to_string());
    }

    // Old channel pages carried the video in the fragment: `#p/u/1/<id>`.
    if let Some(fragment) = url.fragment() {
        let fragment_segments: Vec<&str> = fragment.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(token) = candidate_from_segments(&fragment_segments) {
            return Some(token.to_string());
        }
    }

    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
}

fn candidate_from_segments<'a>(segments: &[&'a str]) -> Option<&'a str> {
    segments.windows(2).find_map(|pair| match pair {
        ["embed" | "v" | "shorts" | "live", token] if !RESERVED_PATH_WORDS.contains(token) => {
            Some(*token)
        }
        _ => None,
    })
    .or_else(|| {
        segments.windows(3).find_map(|triple| match triple {
            ["u", digit, token] if digit.chars().all(|c| c.is_ascii_digit()) => Some(*token),
            _ => None,
        })
    })
}
