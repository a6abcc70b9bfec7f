//! Provider classification and cover derivation for shared music URLs.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const YOUTUBE_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";
pub const SPOTIFY_IMAGE_BASE: &str = "https://i.scdn.co/image";
pub const PLACEHOLDER_COVER_URL: &str = "https://cdn-icons-png.flaticon.com/512/727/727245.png";

const SPOTIFY_TRACK_MARKER: &str = "open.spotify.com/track/";
const YOUTUBE_WATCH_MARKER: &str = "youtube.com/watch?";
const YOUTU_BE_MARKER: &str = "youtu.be/";

lazy_static! {
    static ref YOUTUBE_VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref SPOTIFY_TRACK_ID: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    YouTube,
    Spotify,
    Unknown,
}

impl Provider {
    /// Substring classification, Spotify tracks first.
    pub fn classify(url: &str) -> Provider {
        if url.contains(SPOTIFY_TRACK_MARKER) {
            Provider::Spotify
        } else if watch_video_param(url).is_some() || url.contains(YOUTU_BE_MARKER) {
            Provider::YouTube
        } else {
            Provider::Unknown
        }
    }
}

/// First path or query segment after `marker`, cut at `?`, `#`, `&` or `/`.
fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (_, after) = url.split_once(marker)?;
    after.split(['?', '#', '&', '/']).next().filter(|s| !s.is_empty())
}

/// Value of the `v` parameter of a `youtube.com/watch?` URL, wherever it
/// sits in the query.
fn watch_video_param(url: &str) -> Option<&str> {
    let (_, query) = url.split_once(YOUTUBE_WATCH_MARKER)?;
    query
        .split(['&', '#'])
        .find_map(|pair| pair.strip_prefix("v="))
}

/// The 11-character video id of a `watch?v=` or `youtu.be/` URL.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let candidate = if url.contains(YOUTUBE_WATCH_MARKER) {
        watch_video_param(url)
    } else {
        segment_after(url, YOUTU_BE_MARKER)
    };
    candidate.filter(|id| YOUTUBE_VIDEO_ID.is_match(id))
}

pub fn spotify_track_id(url: &str) -> Option<&str> {
    segment_after(url, SPOTIFY_TRACK_MARKER).filter(|id| SPOTIFY_TRACK_ID.is_match(id))
}

/// Thumbnail for a shared URL, the placeholder when none can be derived.
pub fn cover_url(url: &str) -> String {
    let derived = match Provider::classify(url) {
        Provider::YouTube => youtube_video_id(url)
            .map(|id| format!("{}/{}/hqdefault.jpg", YOUTUBE_THUMBNAIL_BASE, id)),
        Provider::Spotify => {
            spotify_track_id(url).map(|id| format!("{}/{}", SPOTIFY_IMAGE_BASE, id))
        }
        Provider::Unknown => None,
    };
    derived.unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string())
}
