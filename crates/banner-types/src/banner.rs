//! Banner types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted banner as returned by the stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub banner_id: i64,
    pub feature_id: i64,
    pub tag_ids: Vec<i64>,
    /// Opaque document, stored and returned verbatim
    pub content: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Materialize a stored banner from a write request.
    pub fn from_new(banner_id: i64, new: NewBanner, now: DateTime<Utc>) -> Self {
        Self {
            banner_id,
            feature_id: new.feature_id,
            tag_ids: new.tag_ids,
            content: new.content,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

/// Create/update request body, as received from the boundary.
///
/// Every field is lenient here; `content: null` and a missing `content`
/// both decode to `None` so that validation can reject them explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannerPayload {
    #[serde(default)]
    pub feature_id: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub is_active: bool,
}

/// A validated write request.
///
/// `tag_ids` is non-empty and free of duplicates, `feature_id` is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBanner {
    pub feature_id: i64,
    pub tag_ids: Vec<i64>,
    pub content: Value,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_null_content_is_none() {
        let payload: BannerPayload = serde_json::from_value(json!({
            "feature_id": 1,
            "tag_ids": [10],
            "content": null,
            "is_active": true
        }))
        .unwrap();
        assert_eq!(payload.content, None);

        let payload: BannerPayload =
            serde_json::from_value(json!({ "feature_id": 1, "tag_ids": [10] })).unwrap();
        assert_eq!(payload.content, None);
        assert!(!payload.is_active);
    }

    #[test]
    fn test_payload_keeps_nested_content() {
        let payload: BannerPayload = serde_json::from_value(json!({
            "feature_id": 3,
            "tag_ids": [1, 2],
            "content": { "title": "A", "meta": { "n": [1, 2, 3] } },
            "is_active": false
        }))
        .unwrap();
        assert_eq!(
            payload.content,
            Some(json!({ "title": "A", "meta": { "n": [1, 2, 3] } }))
        );
    }

    #[test]
    fn test_banner_from_new() {
        let now = Utc::now();
        let banner = Banner::from_new(
            7,
            NewBanner {
                feature_id: 1,
                tag_ids: vec![10, 20],
                content: json!({ "title": "A" }),
                is_active: true,
            },
            now,
        );

        assert_eq!(banner.banner_id, 7);
        assert_eq!(banner.created_at, banner.updated_at);
        assert!(banner.has_tag(20));
        assert!(!banner.has_tag(30));

        let value = serde_json::to_value(&banner).unwrap();
        assert_eq!(value["tag_ids"], json!([10, 20]));
        assert_eq!(value["content"]["title"], "A");
    }
}
