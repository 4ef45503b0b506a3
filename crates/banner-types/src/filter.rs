//! Listing filter

use serde::{Deserialize, Serialize};

/// Value meaning "any" for an id filter at the service boundary.
pub const ANY_ID: i64 = -1;

/// Filter and pagination for banner listings.
///
/// At the store level `0` means "no filter" for `feature_id` and `tag_id`
/// and "unbounded" for `limit` and `offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerFilter {
    pub feature_id: i64,
    pub tag_id: i64,
    pub limit: i64,
    pub offset: i64,
}

impl BannerFilter {
    pub fn new(feature_id: i64, tag_id: i64, limit: i64, offset: i64) -> Self {
        Self {
            feature_id,
            tag_id,
            limit,
            offset,
        }
    }

    /// Map the `-1` sentinel to `0` and clamp negative pagination to `0`.
    pub fn normalized(self) -> Self {
        let id = |v: i64| if v == ANY_ID { 0 } else { v };
        Self {
            feature_id: id(self.feature_id),
            tag_id: id(self.tag_id),
            limit: self.limit.max(0),
            offset: self.offset.max(0),
        }
    }

    pub fn by_feature(&self) -> Option<i64> {
        (self.feature_id != 0).then_some(self.feature_id)
    }

    pub fn by_tag(&self) -> Option<i64> {
        (self.tag_id != 0).then_some(self.tag_id)
    }

    pub fn limit(&self) -> Option<i64> {
        (self.limit > 0).then_some(self.limit)
    }

    pub fn offset(&self) -> Option<i64> {
        (self.offset > 0).then_some(self.offset)
    }
}
