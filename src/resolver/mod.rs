mod provider;
mod title;

pub use provider::{
    cover_url, spotify_track_id, youtube_video_id, Provider, PLACEHOLDER_COVER_URL,
};
pub use title::{OEmbedTitleResolver, TitleResolver, NOEMBED_ENDPOINT, SPOTIFY_OEMBED_ENDPOINT};
