//! Device Adapter - 音频输出设备

mod headless_device;

pub use headless_device::{probe_duration_ms, HeadlessAudioDevice, HeadlessHandle, DEFAULT_PROGRESS_INTERVAL};
