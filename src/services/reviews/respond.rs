use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{ReviewService, load_review, present_one};
use crate::cache::ObjectCache;
use crate::domain::moderation::{
    authorize_response, authorize_response_delete, authorize_response_edit,
    validate_response_text,
};
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::reviews::{requests::ReviewResponseRequest, responses::ReviewView};
use crate::models::offerings::entities::Offering;
use crate::models::users::entities::Actor;
use crate::services::statistics::invalidate_offering_statistics;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

async fn load_offering(storage: &Arc<dyn Storage>, offering_id: i64) -> Result<Offering> {
    storage
        .get_offering_by_id(offering_id)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Offering {offering_id} not found")))
}

pub(crate) async fn attach_response(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    review_id: i64,
    text: &str,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    let offering = load_offering(storage, review.offering_id).await?;

    authorize_response(actor, &review, &offering)?;
    let text = validate_response_text(text)?;

    let Some(updated) = storage.attach_response(review.id, actor.id, &text).await? else {
        // 比较并交换失败，按当前状态给出原因
        let current = load_review(storage, review_id).await?;
        return Err(if current.response.is_some() {
            FeedbackError::already_responded(format!(
                "Review {} already has a response",
                current.id
            ))
        } else {
            FeedbackError::invalid_transition(format!(
                "Review {} is {} and cannot receive a response",
                current.id, current.status
            ))
        });
    };

    invalidate_offering_statistics(cache, updated.offering_id).await;
    info!("Response attached to review {} by user {}", updated.id, actor.id);
    present_one(storage, actor, updated).await
}

pub(crate) async fn update_response(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    review_id: i64,
    text: &str,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    let offering = load_offering(storage, review.offering_id).await?;
    authorize_response_edit(actor, &review, &offering)?;
    let text = validate_response_text(text)?;

    let updated = storage
        .update_response(review.id, actor.id, &text)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Review {review_id} has no response")))?;

    invalidate_offering_statistics(cache, updated.offering_id).await;
    info!("Response on review {} updated by user {}", updated.id, actor.id);
    present_one(storage, actor, updated).await
}

/// 撤回回复，评价回到可回复状态
pub(crate) async fn delete_response(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    review_id: i64,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    let offering = load_offering(storage, review.offering_id).await?;
    authorize_response_delete(actor, &review, &offering)?;

    let updated = storage
        .delete_response(review.id, actor.id)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Review {review_id} has no response")))?;

    invalidate_offering_statistics(cache, updated.offering_id).await;
    info!("Response on review {} removed by user {}", updated.id, actor.id);
    present_one(storage, actor, updated).await
}

pub async fn handle_attach_response(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
    response_request: ReviewResponseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => {
            attach_response(&storage, cache.as_ref(), &actor, review_id, &response_request.text)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Created().json(ApiResponse::success(
            view,
            "Response added successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

pub async fn handle_update_response(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
    response_request: ReviewResponseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => {
            update_response(&storage, cache.as_ref(), &actor, review_id, &response_request.text)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Response updated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::RESPONSE)),
    }
}

pub async fn handle_delete_response(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => delete_response(&storage, cache.as_ref(), &actor, review_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Response removed successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::RESPONSE)),
    }
}
