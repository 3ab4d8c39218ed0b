//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_device;
mod credential_provider;
mod playlist_store;
mod segment_cache;
mod segment_transfer;
mod synthesis_backend;

pub use audio_device::{AudioDevicePort, DeviceError, DeviceHandle, DeviceStatus};
pub use credential_provider::{Credential, CredentialError, CredentialProviderPort};
pub use playlist_store::{PlaylistStorePort, RepositoryError};
pub use segment_cache::{CacheStats, CacheStoreError, SegmentCachePort};
pub use segment_transfer::{SegmentLocator, SegmentTransferPort, TransferError};
pub use synthesis_backend::{
    SynthesisBackendError, SynthesisBackendPort, SynthesisRequest, SynthesisResponse,
};
