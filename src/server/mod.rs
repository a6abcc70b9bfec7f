pub mod config;
mod http_layers;
mod music_routes;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
use music_routes::make_music_routes;
pub use server::{make_app, run_server};
