//! Command Handlers 实现

mod playback_command_handlers;

pub use playback_command_handlers::*;
