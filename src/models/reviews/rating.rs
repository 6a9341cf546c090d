//! 评分值对象
//!
//! 评分只能是 1..=5 的整数。可选的分项评分缺失时保持为 `None`，
//! 不会被当作 0 参与任何统计。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{FeedbackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(FeedbackError::invalid_rating(format!(
                "Rating must be an integer between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// 仅用于读取已持久化的数据
    pub(crate) fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        i16::from(rating.0)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        f64::from(rating.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Rating::new(value).map_err(|e| serde::de::Error::custom(e.message().to_string()))
    }
}

/// 一条评价的全部评分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct RatingSet {
    pub overall: Rating,
    pub clarity: Option<Rating>,
    pub material: Option<Rating>,
    pub pedagogy: Option<Rating>,
}

impl RatingSet {
    /// 校验原始输入，任何一项越界都会返回 `InvalidRating`
    pub fn from_raw(
        overall: i64,
        clarity: Option<i64>,
        material: Option<i64>,
        pedagogy: Option<i64>,
    ) -> Result<Self> {
        Ok(Self {
            overall: Rating::new(overall)?,
            clarity: clarity.map(Rating::new).transpose()?,
            material: material.map(Rating::new).transpose()?,
            pedagogy: pedagogy.map(Rating::new).transpose()?,
        })
    }
}
