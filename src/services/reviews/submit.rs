use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{info, warn};

use super::{ReviewService, present_one};
use crate::domain::ReviewPolicy;
use crate::domain::guard::SubmissionGuard;
use crate::domain::moderation::{authorize_submission, validate_submission};
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::reviews::{
    entities::ReviewInsertOutcome, requests::SubmitReviewRequest, responses::ReviewView,
};
use crate::models::users::entities::Actor;
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

// 进程内共享的提交锁
static SUBMISSION_GUARD: Lazy<SubmissionGuard> = Lazy::new(SubmissionGuard::new);

pub(crate) async fn submit_review(
    storage: &Arc<dyn Storage>,
    guard: &SubmissionGuard,
    actor: &Actor,
    request: SubmitReviewRequest,
    policy: &ReviewPolicy,
) -> Result<ReviewView> {
    let offering = storage
        .get_offering_by_id(request.offering_id)
        .await?
        .ok_or_else(|| {
            FeedbackError::not_found(format!("Offering {} not found", request.offering_id))
        })?;

    authorize_submission(actor, &offering)?;
    let new_review = validate_submission(&request, policy)?;

    let outcome = guard
        .run(actor.id, offering.id, || {
            storage.insert_review(actor.id, new_review, policy)
        })
        .await?;

    match outcome {
        ReviewInsertOutcome::Inserted(review) => {
            info!(
                "Review {} submitted by user {} for offering {}",
                review.id, actor.id, offering.id
            );
            present_one(storage, actor, review).await
        }
        ReviewInsertOutcome::Duplicate(existing) => {
            warn!(
                "Duplicate review rejected: user {} already has review {} on offering {}",
                actor.id, existing.id, offering.id
            );
            Err(FeedbackError::duplicate_review(format!(
                "You have already reviewed this offering (review {}, {})",
                existing.id, existing.status
            )))
        }
    }
}

pub async fn handle_submit_review(
    service: &ReviewService,
    request: &HttpRequest,
    submit_request: SubmitReviewRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.policy();

    let result = match current_actor(request) {
        Ok(actor) => {
            submit_review(&storage, &SUBMISSION_GUARD, &actor, submit_request, &policy).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Created().json(ApiResponse::success(
            view,
            "Review submitted and awaiting moderation",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::REVIEW)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reviews::entities::ModerationStatus;
    use crate::models::reviews::requests::ReviewQuery;
    use crate::models::users::entities::UserRole;
    use crate::services::reviews::testing::submission;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_offering, seed_user};

    #[tokio::test]
    async fn test_submit_creates_pending_review() {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let guard = SubmissionGuard::new();

        let view = submit_review(
            &storage,
            &guard,
            &student.actor(),
            submission(offering.id, 4),
            &ReviewPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(view.status, ModerationStatus::Pending);
        assert!(view.is_own);
        assert!(view.anonymous);
        assert_eq!(view.ratings.overall.value(), 4);
        assert!(view.ratings.material.is_none());
    }

    #[tokio::test]
    async fn test_second_submission_is_duplicate() {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let guard = SubmissionGuard::new();
        let policy = ReviewPolicy::default();

        submit_review(&storage, &guard, &student.actor(), submission(offering.id, 4), &policy)
            .await
            .unwrap();
        let err = submit_review(&storage, &guard, &student.actor(), submission(offering.id, 2), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::DuplicateReview(_)));
    }

    #[tokio::test]
    async fn test_submission_failures() {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        let cs = seed_offering(&storage, "CS101", "CS", None).await;
        let math = seed_offering(&storage, "MA101", "Math", None).await;
        let guard = SubmissionGuard::new();
        let policy = ReviewPolicy::default();

        let err = submit_review(&storage, &guard, &student.actor(), submission(999, 4), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::NotFound(_)));

        let err = submit_review(&storage, &guard, &student.actor(), submission(math.id, 4), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Forbidden(_)));

        let err = submit_review(&storage, &guard, &teacher.actor(), submission(cs.id, 4), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Forbidden(_)));

        let err = submit_review(&storage, &guard, &student.actor(), submission(cs.id, 0), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidRating(_)));

        let mut short = submission(cs.id, 4);
        short.comment = "  meh  ".to_string();
        let err = submit_review(&storage, &guard, &student.actor(), short, &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));

        // 失败的提交不会留下任何记录
        let stored = storage
            .list_reviews(ReviewQuery::by_reviewer(student.id))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submissions_store_one_review() {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let guard = Arc::new(SubmissionGuard::new());
        let actor = student.actor();

        let mut handles = Vec::new();
        for overall in 1..=5 {
            let storage = storage.clone();
            let guard = guard.clone();
            let actor = actor.clone();
            handles.push(tokio::spawn(async move {
                submit_review(
                    &storage,
                    &guard,
                    &actor,
                    submission(offering.id, overall),
                    &ReviewPolicy::default(),
                )
                .await
            }));
        }

        let mut inserted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => inserted += 1,
                Err(FeedbackError::DuplicateReview(_)) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(duplicates, 4);

        let stored = storage
            .list_reviews(ReviewQuery::by_reviewer(student.id))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }
}
