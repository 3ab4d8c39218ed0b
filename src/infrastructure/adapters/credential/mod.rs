//! Credential Adapter

mod static_credential;

pub use static_credential::StaticCredentialProvider;
