//! 评价的各类读取路径，全部经过可见性过滤

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{ReviewService, load_review, present, present_one};
use crate::config::AppConfig;
use crate::domain::visibility::{can_view_review, visible_reviews};
use crate::errors::{FeedbackError, Result};
use crate::models::offerings::requests::OfferingListQuery;
use crate::models::reviews::{
    entities::{ModerationStatus, Review},
    requests::{RecentReviewsParams, ReviewListParams, ReviewQuery},
    responses::{PendingCountResponse, ReviewListResponse, ReviewView},
};
use crate::models::users::entities::Actor;
use crate::models::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::statistics::visible_scope;
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

const MAX_RECENT_LIMIT: u64 = 50;

fn require_admin(actor: &Actor) -> Result<()> {
    if actor.active && actor.is_admin() {
        Ok(())
    } else {
        Err(FeedbackError::forbidden(
            "Only administrators can access the moderation queue",
        ))
    }
}

async fn paginate(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    reviews: Vec<Review>,
    pagination: &PaginationQuery,
) -> Result<ReviewListResponse> {
    let page = PaginatedResponse::from_vec(reviews, pagination);
    Ok(ReviewListResponse {
        items: present(storage, actor, &page.items).await?,
        pagination: page.pagination,
    })
}

pub(crate) async fn get_review(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    review_id: i64,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    let visible = match storage.get_offering_by_id(review.offering_id).await? {
        Some(offering) => can_view_review(actor, &offering, &review),
        None => false,
    };
    if !visible {
        return Err(FeedbackError::not_found(format!("Review {review_id} not found")));
    }
    present_one(storage, actor, review).await
}

/// 作者本人的全部评价，含待审核与已驳回
pub(crate) async fn my_reviews(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    pagination: &PaginationQuery,
) -> Result<ReviewListResponse> {
    let reviews = storage.list_reviews(ReviewQuery::by_reviewer(actor.id)).await?;
    paginate(storage, actor, reviews, pagination).await
}

/// 对象不可见时返回空列表
pub(crate) async fn offering_reviews(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    offering_id: i64,
    pagination: &PaginationQuery,
) -> Result<ReviewListResponse> {
    let reviews = match storage.get_offering_by_id(offering_id).await? {
        Some(offering) => {
            let all = storage.list_reviews(ReviewQuery::by_offering(offering.id)).await?;
            visible_reviews(actor, &offering, all)
        }
        None => Vec::new(),
    };
    paginate(storage, actor, reviews, pagination).await
}

pub(crate) async fn pending_reviews(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    pagination: &PaginationQuery,
) -> Result<ReviewListResponse> {
    require_admin(actor)?;
    let mut reviews = storage
        .list_reviews(ReviewQuery::with_status(ModerationStatus::Pending))
        .await?;
    // 审核队列先进先出
    reviews.reverse();
    paginate(storage, actor, reviews, pagination).await
}

pub(crate) async fn pending_count(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
) -> Result<PendingCountResponse> {
    require_admin(actor)?;
    Ok(PendingCountResponse {
        count: storage
            .count_reviews_by_status(ModerationStatus::Pending)
            .await?,
    })
}

/// 负责人名下对象收到的已通过评价
pub(crate) async fn received_reviews(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    pagination: &PaginationQuery,
) -> Result<ReviewListResponse> {
    let owned = storage
        .list_offerings(OfferingListQuery {
            responsible_id: Some(actor.id),
            include_inactive: true,
            ..Default::default()
        })
        .await?;
    let ids = owned.iter().map(|o| o.id).collect();
    let reviews = storage.list_reviews(ReviewQuery::approved_for(ids)).await?;
    paginate(storage, actor, reviews, pagination).await
}

pub(crate) async fn recent_reviews(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    limit: Option<u64>,
    default_limit: u64,
) -> Result<Vec<ReviewView>> {
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_RECENT_LIMIT);
    let scope = visible_scope(storage, actor, None).await?;
    let ids = scope.iter().map(|o| o.id).collect();
    let reviews = storage
        .list_reviews(ReviewQuery::approved_for(ids).limit(limit))
        .await?;
    present(storage, actor, &reviews).await
}

pub async fn handle_get_review(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => get_review(&storage, &actor, review_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Review retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

fn list_response(result: Result<ReviewListResponse>) -> HttpResponse {
    match result {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(
            list,
            "Reviews retrieved successfully",
        )),
        Err(e) => error_response(&e, ErrorCodes::REVIEW),
    }
}

pub async fn handle_my_reviews(
    service: &ReviewService,
    request: &HttpRequest,
    params: ReviewListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => my_reviews(&storage, &actor, &params.pagination).await,
        Err(e) => Err(e),
    };
    Ok(list_response(result))
}

pub async fn handle_offering_reviews(
    service: &ReviewService,
    request: &HttpRequest,
    offering_id: i64,
    params: ReviewListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => offering_reviews(&storage, &actor, offering_id, &params.pagination).await,
        Err(e) => Err(e),
    };
    Ok(list_response(result))
}

pub async fn handle_pending_reviews(
    service: &ReviewService,
    request: &HttpRequest,
    params: ReviewListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => pending_reviews(&storage, &actor, &params.pagination).await,
        Err(e) => Err(e),
    };
    Ok(list_response(result))
}

pub async fn handle_pending_count(
    service: &ReviewService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => pending_count(&storage, &actor).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            count,
            "Pending review count retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

pub async fn handle_received_reviews(
    service: &ReviewService,
    request: &HttpRequest,
    params: ReviewListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => received_reviews(&storage, &actor, &params.pagination).await,
        Err(e) => Err(e),
    };
    Ok(list_response(result))
}

pub async fn handle_recent_reviews(
    service: &ReviewService,
    request: &HttpRequest,
    params: RecentReviewsParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let default_limit = AppConfig::get().review.recent_reviews_limit;
    let result = match current_actor(request) {
        Ok(actor) => recent_reviews(&storage, &actor, params.limit, default_limit).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Recent reviews retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}
