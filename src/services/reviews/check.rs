use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::ReviewService;
use crate::domain::ReviewPolicy;
use crate::domain::guard::blocking_review;
use crate::domain::moderation::authorize_submission;
use crate::domain::visibility::can_view_offering;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::reviews::{
    requests::{ReviewCheckParams, ReviewQuery},
    responses::ReviewCheckResponse,
};
use crate::models::users::entities::Actor;
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn check_review(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    offering_id: i64,
    policy: &ReviewPolicy,
) -> Result<ReviewCheckResponse> {
    let Some(offering) = storage
        .get_offering_by_id(offering_id)
        .await?
        .filter(|o| can_view_offering(actor, o))
    else {
        // 范围外的对象按空结果处理
        return Ok(ReviewCheckResponse {
            can_submit: false,
            existing_review_id: None,
            existing_status: None,
        });
    };

    let existing = storage
        .list_reviews(ReviewQuery {
            reviewer_id: Some(actor.id),
            offering_ids: Some(vec![offering.id]),
            ..Default::default()
        })
        .await?;

    let blocking = blocking_review(&existing, actor.id, offering.id, policy);
    // 列表按创建时间倒序，首条即最近一次
    let latest = blocking.or(existing.first());

    Ok(ReviewCheckResponse {
        can_submit: blocking.is_none() && authorize_submission(actor, &offering).is_ok(),
        existing_review_id: latest.map(|r| r.id),
        existing_status: latest.map(|r| r.status),
    })
}

pub async fn handle_check_review(
    service: &ReviewService,
    request: &HttpRequest,
    params: ReviewCheckParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.policy();

    let result = match current_actor(request) {
        Ok(actor) => check_review(&storage, &actor, params.offering_id, &policy).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Review eligibility checked",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guard::SubmissionGuard;
    use crate::models::reviews::entities::ModerationStatus;
    use crate::models::users::entities::UserRole;
    use crate::services::reviews::moderate::moderate_review;
    use crate::services::reviews::submit::submit_review;
    use crate::services::reviews::testing::submission;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_offering, seed_user};

    #[tokio::test]
    async fn test_check_follows_submission_lifecycle() {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let strict = ReviewPolicy::default();
        let lenient = ReviewPolicy {
            rejected_blocks_resubmission: false,
            ..ReviewPolicy::default()
        };

        let fresh = check_review(&storage, &student.actor(), offering.id, &strict)
            .await
            .unwrap();
        assert!(fresh.can_submit);
        assert!(fresh.existing_review_id.is_none());

        let pending = submit_review(
            &storage,
            &SubmissionGuard::new(),
            &student.actor(),
            submission(offering.id, 2),
            &strict,
        )
        .await
        .unwrap();
        let blocked = check_review(&storage, &student.actor(), offering.id, &strict)
            .await
            .unwrap();
        assert!(!blocked.can_submit);
        assert_eq!(blocked.existing_review_id, Some(pending.id));
        assert_eq!(blocked.existing_status, Some(ModerationStatus::Pending));

        moderate_review(&storage, None, &admin.actor(), pending.id, ModerationStatus::Rejected)
            .await
            .unwrap();
        let rejected = check_review(&storage, &student.actor(), offering.id, &strict)
            .await
            .unwrap();
        assert!(!rejected.can_submit);

        let relaxed = check_review(&storage, &student.actor(), offering.id, &lenient)
            .await
            .unwrap();
        assert!(relaxed.can_submit);
        assert_eq!(relaxed.existing_status, Some(ModerationStatus::Rejected));
    }

    #[tokio::test]
    async fn test_teachers_cannot_submit() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let result = check_review(&storage, &teacher.actor(), offering.id, &ReviewPolicy::default())
            .await
            .unwrap();
        assert!(!result.can_submit);
    }

    #[tokio::test]
    async fn test_out_of_scope_offering_cannot_be_reviewed() {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("Math")).await;
        let offering = seed_offering(&storage, "CS101", "CS", None).await;
        let policy = ReviewPolicy::default();

        let hidden = check_review(&storage, &student.actor(), offering.id, &policy)
            .await
            .unwrap();
        assert!(!hidden.can_submit);
        assert!(hidden.existing_review_id.is_none());

        let missing = check_review(&storage, &student.actor(), 999, &policy)
            .await
            .unwrap();
        assert!(!missing.can_submit);
        assert!(missing.existing_status.is_none());
    }
}
