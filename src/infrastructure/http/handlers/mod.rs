//! HTTP Handlers

mod cache;
mod ping;
mod playback;
mod playlist;
mod websocket;

pub use cache::*;
pub use ping::*;
pub use playback::*;
pub use playlist::*;
pub use websocket::*;
