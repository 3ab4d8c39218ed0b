//! Application Services - 播放引擎
//!
//! - segment_synthesizer: 单片段合成、缓存与加载
//! - playback_sequencer: 顺序播放状态机

mod playback_sequencer;
mod segment_synthesizer;

pub use playback_sequencer::{PlaybackOutcome, PlaybackSnapshot, Player, SequencerConfig};
pub use segment_synthesizer::{LoadedSegment, SegmentProgress, SegmentSynthesizer};
