//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod credential;
pub mod device;
pub mod storage;
pub mod synthesis;
pub mod transfer;

pub use credential::*;
pub use device::*;
pub use storage::*;
pub use synthesis::*;
pub use transfer::*;
