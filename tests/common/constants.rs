//! Shared constants for end-to-end tests
//!
//! When the seeded catalog changes, update only this file.

// ============================================================================
// Seeded catalog, oldest first
// ============================================================================

pub const SONG_1_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const SONG_1_TITLE: &str = "Never Gonna Give You Up";
pub const SONG_1_SHARED_BY: &str = "Rick";
pub const SONG_1_SHARED_AT: &str = "2023-05-01T10:00:00.000Z";

pub const SONG_2_URL: &str = "https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT";
pub const SONG_2_TITLE: &str = "Bohemian Rhapsody";
pub const SONG_2_SHARED_BY: &str = "Freddie";
pub const SONG_2_SHARED_AT: &str = "2023-06-15T18:30:00.000Z";

pub const SONG_3_URL: &str = "https://youtu.be/9bZkp7q19f0";
pub const SONG_3_TITLE: &str = "Gangnam Style";
pub const SONG_3_SHARED_BY: &str = "Rick";
pub const SONG_3_SHARED_AT: &str = "2024-01-01T00:00:00.000Z";

pub const SEEDED_ENTRIES_COUNT: usize = 3;

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
