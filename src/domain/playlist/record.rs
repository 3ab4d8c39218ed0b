//! Playlist Context - 播放列表缓存记录
//!
//! 每个内容一条记录，按变体保存完整播放过的片段标识序列。
//! `bucketId` 是记录的主存储桶；不在主桶里的片段记入 `segmentBuckets`。
//! 解析是容错的：损坏、为空或版本过新的记录一律视为空记录（缓存未命中）。
//! 兼容旧格式 `{bucketId, docParts, summaryParts, summaryDetailedParts, summaryDetailedText}`。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::Variant;
use crate::domain::playback::{BucketRef, SegmentId};

/// 当前记录格式版本
pub const PLAYLIST_RECORD_VERSION: u32 = 1;

/// 旧格式字段到变体的映射
const LEGACY_PART_FIELDS: [(&str, &str); 3] = [
    ("docParts", Variant::DOCUMENT),
    ("summaryParts", Variant::SUMMARY),
    ("summaryDetailedParts", Variant::SUMMARY_DETAILED),
];

const LEGACY_TEXT_FIELD: (&str, &str) = ("summaryDetailedText", Variant::SUMMARY_DETAILED);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCacheRecord {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bucket_id: Option<BucketRef>,
    #[serde(default)]
    variants: BTreeMap<String, Vec<SegmentId>>,
    #[serde(default)]
    texts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    segment_buckets: BTreeMap<String, BucketRef>,
}

impl Default for PlaylistCacheRecord {
    fn default() -> Self {
        Self {
            version: PLAYLIST_RECORD_VERSION,
            bucket_id: None,
            variants: BTreeMap::new(),
            texts: BTreeMap::new(),
            segment_buckets: BTreeMap::new(),
        }
    }
}

impl PlaylistCacheRecord {
    /// 容错解析，任何无法识别的内容都得到空记录
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt playlist cache record, treating as empty");
                return Self::default();
            }
        };

        let Some(object) = value.as_object() else {
            tracing::warn!("Playlist cache record is not an object, treating as empty");
            return Self::default();
        };

        match object.get("version").and_then(Value::as_u64) {
            Some(version) if version > PLAYLIST_RECORD_VERSION as u64 => {
                tracing::warn!(version, "Unsupported playlist cache record version, treating as empty");
                Self::default()
            }
            Some(_) => match serde_json::from_value::<Self>(value) {
                Ok(mut record) => {
                    record.version = PLAYLIST_RECORD_VERSION;
                    record.drop_empty_variants();
                    record
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed playlist cache record, treating as empty");
                    Self::default()
                }
            },
            None => Self::from_legacy(object),
        }
    }

    fn from_legacy(object: &serde_json::Map<String, Value>) -> Self {
        let mut record = Self {
            bucket_id: object
                .get("bucketId")
                .and_then(Value::as_str)
                .and_then(|b| BucketRef::new(b).ok()),
            ..Self::default()
        };

        for (field, variant) in LEGACY_PART_FIELDS {
            let ids: Vec<SegmentId> = object
                .get(field)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(|id| SegmentId::new(id).ok())
                        .collect()
                })
                .unwrap_or_default();
            if !ids.is_empty() {
                record.variants.insert(variant.to_string(), ids);
            }
        }

        let (field, variant) = LEGACY_TEXT_FIELD;
        if let Some(text) = object.get(field).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                record.texts.insert(variant.to_string(), text.to_string());
            }
        }

        record
    }

    fn drop_empty_variants(&mut self) {
        for ids in self.variants.values_mut() {
            ids.retain(|id| !id.as_str().trim().is_empty());
        }
        self.variants.retain(|_, ids| !ids.is_empty());
        self.prune_segment_buckets();
    }

    /// 只保留仍被某个变体引用、且不在主桶中的片段桶
    fn prune_segment_buckets(&mut self) {
        let referenced: BTreeSet<&str> = self
            .variants
            .values()
            .flatten()
            .map(SegmentId::as_str)
            .collect();
        let primary = self.bucket_id.as_ref();
        self.segment_buckets
            .retain(|id, bucket| referenced.contains(id.as_str()) && Some(&*bucket) != primary);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn bucket_id(&self) -> Option<&BucketRef> {
        self.bucket_id.as_ref()
    }

    /// 片段所在的存储桶，未单独记录时为主桶
    pub fn bucket_for(&self, segment_id: &SegmentId) -> Option<&BucketRef> {
        self.segment_buckets
            .get(segment_id.as_str())
            .or(self.bucket_id.as_ref())
    }

    /// 变体的片段及各自的存储桶，用于重放
    pub fn replay_segments(&self, variant: &Variant) -> Option<Vec<(SegmentId, Option<BucketRef>)>> {
        self.segments(variant).map(|ids| {
            ids.iter()
                .map(|id| (id.clone(), self.bucket_for(id).cloned()))
                .collect()
        })
    }

    /// 变体的片段标识，没有记录或为空时返回 None
    pub fn segments(&self, variant: &Variant) -> Option<&[SegmentId]> {
        self.variants
            .get(variant.as_str())
            .map(Vec::as_slice)
            .filter(|ids| !ids.is_empty())
    }

    pub fn cached_text(&self, variant: &Variant) -> Option<&str> {
        self.texts
            .get(variant.as_str())
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty() && self.texts.is_empty()
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// 写入一个变体完整播放后的结果，覆盖该变体原有内容
    ///
    /// `segments` 是按播放顺序的 (片段标识, 实际存储桶)。
    /// 主桶只在记录没有其他变体时改写，避免其他变体的片段指向错误的桶。
    pub fn record_completed(
        &mut self,
        variant: &Variant,
        segments: Vec<(SegmentId, BucketRef)>,
        text: Option<String>,
    ) {
        self.variants.remove(variant.as_str());
        if self.bucket_id.is_none() || self.variants.is_empty() {
            if let Some((_, bucket)) = segments.first() {
                self.bucket_id = Some(bucket.clone());
            }
        }

        let mut segment_ids = Vec::with_capacity(segments.len());
        for (segment_id, bucket) in segments {
            if self.bucket_id.as_ref() != Some(&bucket) {
                self.segment_buckets.insert(segment_id.to_string(), bucket);
            }
            segment_ids.push(segment_id);
        }
        if !segment_ids.is_empty() {
            self.variants.insert(variant.to_string(), segment_ids);
        }
        self.prune_segment_buckets();

        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            self.texts.insert(variant.to_string(), text);
        }
    }

    /// 清除一个变体的片段标识（原文变化时使用），其他变体不受影响
    pub fn clear_variant(&mut self, variant: &Variant) -> bool {
        let cleared = self.variants.remove(variant.as_str()).is_some();
        self.prune_segment_buckets();
        cleared
    }
}
