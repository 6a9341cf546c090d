use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{ReviewService, load_review, present_one};
use crate::cache::ObjectCache;
use crate::domain::moderation::moderate;
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::reviews::{
    entities::ModerationStatus, requests::ModerateReviewRequest, responses::ReviewView,
};
use crate::models::users::entities::Actor;
use crate::services::statistics::invalidate_offering_statistics;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn moderate_review(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    review_id: i64,
    decision: ModerationStatus,
) -> Result<ReviewView> {
    let review = load_review(storage, review_id).await?;
    let decision = moderate(actor, &review, decision)?;

    // 并发审核时只有一次比较并交换能成功
    let Some(updated) = storage
        .transition_review_status(review.id, ModerationStatus::Pending, decision, actor.id)
        .await?
    else {
        let current = load_review(storage, review_id).await?;
        return Err(FeedbackError::invalid_transition(format!(
            "Review {} has already been moderated ({})",
            current.id, current.status
        )));
    };

    invalidate_offering_statistics(cache, updated.offering_id).await;
    info!(
        "Review {} {} by admin {}",
        updated.id, updated.status, actor.id
    );
    present_one(storage, actor, updated).await
}

pub async fn handle_moderate_review(
    service: &ReviewService,
    request: &HttpRequest,
    review_id: i64,
    moderate_request: ModerateReviewRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => {
            moderate_review(
                &storage,
                cache.as_ref(),
                &actor,
                review_id,
                moderate_request.decision,
            )
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Review moderated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::domain::ReviewPolicy;
    use crate::domain::guard::SubmissionGuard;
    use crate::models::users::entities::UserRole;
    use crate::services::reviews::submit::submit_review;
    use crate::services::reviews::testing::submission;
    use crate::services::statistics::cached_offering_statistics;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_offering, seed_user};

    #[tokio::test]
    async fn test_approval_publishes_into_statistics() {
        let storage = memory_storage().await;
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_capacity(64, 300));
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;

        let pending = submit_review(
            &storage,
            &SubmissionGuard::new(),
            &student.actor(),
            submission(offering.id, 5),
            &ReviewPolicy::default(),
        )
        .await
        .unwrap();

        // 待审核的评价不参与统计
        let before = cached_offering_statistics(&storage, Some(&cache), &offering)
            .await
            .unwrap();
        assert_eq!(before.total_reviews, 0);

        let approved = moderate_review(
            &storage,
            Some(&cache),
            &admin.actor(),
            pending.id,
            ModerationStatus::Approved,
        )
        .await
        .unwrap();
        assert_eq!(approved.status, ModerationStatus::Approved);
        assert!(approved.moderated_at.is_some());

        let after = cached_offering_statistics(&storage, Some(&cache), &offering)
            .await
            .unwrap();
        assert_eq!(after.total_reviews, 1);
        assert_eq!(after.mean_overall, Some(5.0));
    }

    #[tokio::test]
    async fn test_second_moderation_is_invalid_transition() {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;

        let pending = submit_review(
            &storage,
            &SubmissionGuard::new(),
            &student.actor(),
            submission(offering.id, 2),
            &ReviewPolicy::default(),
        )
        .await
        .unwrap();

        moderate_review(&storage, None, &admin.actor(), pending.id, ModerationStatus::Rejected)
            .await
            .unwrap();
        let err = moderate_review(&storage, None, &admin.actor(), pending.id, ModerationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidTransition(_)));

        let stored = load_review(&storage, pending.id).await.unwrap();
        assert_eq!(stored.status, ModerationStatus::Rejected);
        assert_eq!(stored.moderated_by, Some(admin.id));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_moderate() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", Some(teacher.id)).await;

        let pending = submit_review(
            &storage,
            &SubmissionGuard::new(),
            &student.actor(),
            submission(offering.id, 3),
            &ReviewPolicy::default(),
        )
        .await
        .unwrap();

        let err = moderate_review(&storage, None, &teacher.actor(), pending.id, ModerationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Forbidden(_)));

        let err = moderate_review(&storage, None, &teacher.actor(), 999, ModerationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::NotFound(_)));
    }
}
