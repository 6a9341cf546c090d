use super::entities::ModerationStatus;
use super::rating::RatingSet;
use crate::models::common::PaginationInfo;
use crate::models::offerings::entities::OfferingBrief;
use serde::Serialize;
use ts_rs::TS;

// 回复的对外投影
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewReplyView {
    pub text: String,
    pub responder_id: i64,
    pub responder_name: Option<String>,
    pub responded_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 评价的对外投影
//
// 匿名评价对非管理员隐藏 reviewer_id 与 reviewer_name，
// 作者本人通过 is_own 识别自己的评价
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewView {
    pub id: i64,
    pub offering_id: i64,
    pub offering: Option<OfferingBrief>,
    pub reviewer_id: Option<i64>,
    pub reviewer_name: Option<String>,
    pub anonymous: bool,
    pub is_own: bool,
    pub ratings: RatingSet,
    pub comment: String,
    pub status: ModerationStatus,
    pub moderated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub response: Option<ReviewReplyView>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewListResponse {
    pub items: Vec<ReviewView>,
    pub pagination: PaginationInfo,
}

// 能否提交评价
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewCheckResponse {
    pub can_submit: bool,
    pub existing_review_id: Option<i64>,
    pub existing_status: Option<ModerationStatus>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct PendingCountResponse {
    pub count: i64,
}
