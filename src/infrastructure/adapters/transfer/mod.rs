//! Transfer Adapter - 远程片段下载

mod http_segment_transfer;

pub use http_segment_transfer::HttpSegmentTransfer;
