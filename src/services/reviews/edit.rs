use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{ReviewService, load_review, present_one};
use crate::cache::ObjectCache;
use crate::domain::ReviewPolicy;
use crate::domain::moderation::{authorize_delete, authorize_edit, validate_edit};
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::reviews::{requests::UpdateReviewRequest, responses::ReviewView};
use crate::models::users::entities::Actor;
use crate::services::statistics::invalidate_offering_statistics;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn update_review(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    review_id: i64,
    request: &UpdateReviewRequest,
    policy: &ReviewPolicy,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    authorize_edit(actor, &review)?;
    let content = validate_edit(&review, request, policy)?;

    let Some(updated) = storage.update_pending_review(review.id, content).await? else {
        return Err(FeedbackError::invalid_transition(format!(
            "Review {review_id} was moderated before the edit was saved"
        )));
    };

    info!("Review {} edited by user {}", updated.id, actor.id);
    present_one(storage, actor, updated).await
}

pub(crate) async fn delete_review(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    review_id: i64,
) -> Result<()> {
    let review = load_review(storage, review_id).await?;
    authorize_delete(actor, &review)?;

    if !storage.soft_delete_review(review.id).await? {
        return Err(FeedbackError::not_found(format!("Review {review_id} not found")));
    }

    invalidate_offering_statistics(cache, review.offering_id).await;
    info!("Review {} deleted by user {}", review.id, actor.id);
    Ok(())
}

pub async fn handle_update_review(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
    update_request: UpdateReviewRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.policy();

    let result = match current_actor(request) {
        Ok(actor) => update_review(&storage, &actor, review_id, &update_request, &policy).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Review updated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

pub async fn handle_delete_review(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => delete_review(&storage, cache.as_ref(), &actor, review_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Review deleted successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}
