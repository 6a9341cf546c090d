use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::rating::RatingSet;

// 审核状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "review.ts")]
pub enum ModerationStatus {
    Pending,  // 待审核（初始状态）
    Approved, // 已通过
    Rejected, // 已驳回
}

impl ModerationStatus {
    pub const PENDING: &'static str = "pending";
    pub const APPROVED: &'static str = "approved";
    pub const REJECTED: &'static str = "rejected";

    /// 审核决定只能是通过或驳回
    pub fn is_decision(self) -> bool {
        matches!(self, ModerationStatus::Approved | ModerationStatus::Rejected)
    }
}

impl<'de> Deserialize<'de> for ModerationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<ModerationStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的审核状态: '{s}'. 支持的状态: pending, approved, rejected"
            ))
        })
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationStatus::Pending => write!(f, "{}", ModerationStatus::PENDING),
            ModerationStatus::Approved => write!(f, "{}", ModerationStatus::APPROVED),
            ModerationStatus::Rejected => write!(f, "{}", ModerationStatus::REJECTED),
        }
    }
}

impl std::str::FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ModerationStatus::PENDING => Ok(ModerationStatus::Pending),
            ModerationStatus::APPROVED => Ok(ModerationStatus::Approved),
            ModerationStatus::REJECTED => Ok(ModerationStatus::Rejected),
            _ => Err(format!("Invalid moderation status: {s}")),
        }
    }
}

// 负责人回复，每条评价至多一条
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewReply {
    pub text: String,
    pub responder_id: i64,
    pub responded_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 评价实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "review.ts")]
pub struct Review {
    pub id: i64,
    pub offering_id: i64,
    pub reviewer_id: i64,
    pub ratings: RatingSet,
    pub comment: String,
    pub anonymous: bool,
    pub status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub response: Option<ReviewReply>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Review {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.reviewer_id == user_id
    }

    /// 未删除且已通过审核，只有这类评价参与统计与公开展示
    pub fn is_published(&self) -> bool {
        !self.is_deleted() && self.is_approved()
    }
}

/// 写入存储前已校验过的评价内容
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub offering_id: i64,
    pub ratings: RatingSet,
    pub comment: String,
    pub anonymous: bool,
}

/// 原子插入的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInsertOutcome {
    Inserted(Review),
    /// 同一 (评价人, 对象) 已存在占用名额的评价
    Duplicate(Review),
}
