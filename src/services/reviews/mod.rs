//! 评价服务
//!
//! 每个操作分两层：`handle_*` 负责取参与者与存储并渲染响应，
//! 同名的核心函数只依赖 `Storage`，便于在内存数据库上测试。

pub mod check;
pub mod edit;
pub mod list;
pub mod moderate;
pub mod respond;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::ReviewPolicy;
use crate::domain::visibility::project_review;
use crate::errors::{FeedbackError, Result};
use crate::models::reviews::{
    entities::Review,
    requests::{
        ModerateReviewRequest, RecentReviewsParams, ReviewCheckParams, ReviewListParams,
        ReviewResponseRequest, SubmitReviewRequest, UpdateReviewRequest,
    },
    responses::ReviewView,
};
use crate::models::users::entities::Actor;
use crate::storage::Storage;

pub struct ReviewService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReviewService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn policy(&self) -> ReviewPolicy {
        ReviewPolicy::from(&AppConfig::get().review)
    }

    // 提交评价
    pub async fn submit_review(
        &self,
        request: &HttpRequest,
        submit_request: SubmitReviewRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit_review(self, request, submit_request).await
    }

    // 单条评价
    pub async fn get_review(&self, request: &HttpRequest, review_id: i64) -> ActixResult<HttpResponse> {
        list::handle_get_review(self, request, review_id).await
    }

    // 作者修改待审核评价
    pub async fn update_review(
        &self,
        request: &HttpRequest,
        review_id: i64,
        update_request: UpdateReviewRequest,
    ) -> ActixResult<HttpResponse> {
        edit::handle_update_review(self, request, review_id, update_request).await
    }

    // 作者或管理员删除评价
    pub async fn delete_review(
        &self,
        request: &HttpRequest,
        review_id: i64,
    ) -> ActixResult<HttpResponse> {
        edit::handle_delete_review(self, request, review_id).await
    }

    // 管理员审核
    pub async fn moderate_review(
        &self,
        request: &HttpRequest,
        review_id: i64,
        moderate_request: ModerateReviewRequest,
    ) -> ActixResult<HttpResponse> {
        moderate::handle_moderate_review(self, request, review_id, moderate_request).await
    }

    // 负责人回复
    pub async fn attach_response(
        &self,
        request: &HttpRequest,
        review_id: i64,
        response_request: ReviewResponseRequest,
    ) -> ActixResult<HttpResponse> {
        respond::handle_attach_response(self, request, review_id, response_request).await
    }

    pub async fn update_response(
        &self,
        request: &HttpRequest,
        review_id: i64,
        response_request: ReviewResponseRequest,
    ) -> ActixResult<HttpResponse> {
        respond::handle_update_response(self, request, review_id, response_request).await
    }

    // 撤回回复
    pub async fn delete_response(
        &self,
        request: &HttpRequest,
        review_id: i64,
    ) -> ActixResult<HttpResponse> {
        respond::handle_delete_response(self, request, review_id).await
    }

    // 能否对某对象提交评价
    pub async fn check_review(
        &self,
        request: &HttpRequest,
        params: ReviewCheckParams,
    ) -> ActixResult<HttpResponse> {
        check::handle_check_review(self, request, params).await
    }

    // 我的评价
    pub async fn list_my_reviews(
        &self,
        request: &HttpRequest,
        params: ReviewListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_my_reviews(self, request, params).await
    }

    // 某对象下的评价
    pub async fn list_offering_reviews(
        &self,
        request: &HttpRequest,
        offering_id: i64,
        params: ReviewListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_offering_reviews(self, request, offering_id, params).await
    }

    // 待审核队列
    pub async fn list_pending_reviews(
        &self,
        request: &HttpRequest,
        params: ReviewListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_pending_reviews(self, request, params).await
    }

    pub async fn count_pending_reviews(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_pending_count(self, request).await
    }

    // 负责人收到的评价
    pub async fn list_received_reviews(
        &self,
        request: &HttpRequest,
        params: ReviewListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_received_reviews(self, request, params).await
    }

    // 最新评价
    pub async fn list_recent_reviews(
        &self,
        request: &HttpRequest,
        params: RecentReviewsParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_recent_reviews(self, request, params).await
    }
}

/// 读取未删除的评价，不存在时返回 NotFound
pub(crate) async fn load_review(storage: &Arc<dyn Storage>, review_id: i64) -> Result<Review> {
    storage
        .get_review_by_id(review_id)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Review {review_id} not found")))
}

/// 批量加载关联的用户与对象后投影
pub(crate) async fn present(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    reviews: &[Review],
) -> Result<Vec<ReviewView>> {
    let user_ids: Vec<i64> = reviews
        .iter()
        .flat_map(|r| {
            std::iter::once(r.reviewer_id).chain(r.response.as_ref().map(|reply| reply.responder_id))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let offering_ids: Vec<i64> = reviews
        .iter()
        .map(|r| r.offering_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let users: HashMap<i64, _> = storage
        .get_users_by_ids(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let offerings: HashMap<i64, _> = storage
        .get_offerings_by_ids(&offering_ids)
        .await?
        .into_iter()
        .map(|o| (o.id, o))
        .collect();

    Ok(reviews
        .iter()
        .map(|review| {
            let responder = review
                .response
                .as_ref()
                .and_then(|reply| users.get(&reply.responder_id));
            project_review(
                actor,
                review,
                users.get(&review.reviewer_id),
                responder,
                offerings.get(&review.offering_id),
            )
        })
        .collect())
}

pub(crate) async fn present_one(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    review: Review,
) -> Result<ReviewView> {
    present(storage, actor, std::slice::from_ref(&review))
        .await?
        .pop()
        .ok_or_else(|| FeedbackError::not_found(format!("Review {} not found", review.id)))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::models::reviews::requests::SubmitReviewRequest;

    pub fn submission(offering_id: i64, overall: i64) -> SubmitReviewRequest {
        SubmitReviewRequest {
            offering_id,
            rating_overall: overall,
            rating_clarity: Some(4),
            rating_material: None,
            rating_pedagogy: None,
            comment: "Well organised and clearly taught".to_string(),
            anonymous: true,
        }
    }
}
