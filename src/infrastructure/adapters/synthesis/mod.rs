//! Synthesis Adapter - 云函数语音合成客户端

mod http_synthesis_client;

pub use http_synthesis_client::{HttpSynthesisClient, HttpSynthesisClientConfig};
