//! Playlist Context - Value Objects

use serde::{Deserialize, Serialize};

/// 内容变体名称
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variant(String);

impl Variant {
    pub const DOCUMENT: &'static str = "document";
    pub const SUMMARY: &'static str = "summary";
    pub const SUMMARY_DETAILED: &'static str = "summary_detailed";

    pub fn new(name: impl Into<String>) -> Result<Self, &'static str> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err("变体名称不能为空");
        }
        if name.len() > 64 {
            return Err("变体名称长度不能超过64字符");
        }
        Ok(Self(name.to_string()))
    }

    pub fn document() -> Self {
        Self(Self::DOCUMENT.to_string())
    }

    pub fn summary() -> Self {
        Self(Self::SUMMARY.to_string())
    }

    pub fn summary_detailed() -> Self {
        Self(Self::SUMMARY_DETAILED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
