use super::entities::ModerationStatus;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

fn default_anonymous() -> bool {
    true
}

// 提交评价请求
//
// 评分以原始整数接收，越界由领域层报告为 InvalidRating
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct SubmitReviewRequest {
    pub offering_id: i64,
    pub rating_overall: i64,
    pub rating_clarity: Option<i64>,
    pub rating_material: Option<i64>,
    pub rating_pedagogy: Option<i64>,
    pub comment: String,
    #[serde(default = "default_anonymous")]
    pub anonymous: bool,
}

// 修改待审核评价（整体替换内容）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct UpdateReviewRequest {
    pub rating_overall: i64,
    pub rating_clarity: Option<i64>,
    pub rating_material: Option<i64>,
    pub rating_pedagogy: Option<i64>,
    pub comment: String,
    pub anonymous: Option<bool>,
}

// 审核请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ModerateReviewRequest {
    pub decision: ModerationStatus,
}

// 负责人回复请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewResponseRequest {
    pub text: String,
}

// 分页列表参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct RecentReviewsParams {
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewCheckParams {
    pub offering_id: i64,
}

// 评价查询条件（用于存储层），软删除的评价总是被排除
#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub status: Option<ModerationStatus>,
    pub offering_ids: Option<Vec<i64>>,
    pub reviewer_id: Option<i64>,
    pub limit: Option<u64>,
}

impl ReviewQuery {
    pub fn approved_for(offering_ids: Vec<i64>) -> Self {
        Self {
            status: Some(ModerationStatus::Approved),
            offering_ids: Some(offering_ids),
            ..Default::default()
        }
    }

    pub fn by_reviewer(reviewer_id: i64) -> Self {
        Self {
            reviewer_id: Some(reviewer_id),
            ..Default::default()
        }
    }

    pub fn by_offering(offering_id: i64) -> Self {
        Self {
            offering_ids: Some(vec![offering_id]),
            ..Default::default()
        }
    }

    pub fn with_status(status: ModerationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
