//! 审核状态机
//!
//! ```text
//! PENDING ──(管理员通过)──> APPROVED ──(负责人回复一次)──> APPROVED + 回复
//!    └────(管理员驳回)──> REJECTED
//! ```
//!
//! 每个函数只做判定，真正的状态变更由存储层以比较并交换的方式执行。

use super::ReviewPolicy;
use super::visibility::can_view_offering;
use crate::errors::{FeedbackError, Result};
use crate::models::offerings::entities::Offering;
use crate::models::reviews::entities::{ModerationStatus, NewReview, Review};
use crate::models::reviews::rating::RatingSet;
use crate::models::reviews::requests::{SubmitReviewRequest, UpdateReviewRequest};
use crate::models::users::entities::Actor;

/// 提交权限：启用中的学生，且对象启用并对其可见
pub fn authorize_submission(actor: &Actor, offering: &Offering) -> Result<()> {
    if !actor.active || !actor.is_student() {
        return Err(FeedbackError::forbidden("Only active students can submit reviews"));
    }
    if !offering.is_active || !can_view_offering(actor, offering) {
        return Err(FeedbackError::forbidden(
            "This offering is not open to reviews from your department",
        ));
    }
    Ok(())
}

/// 校验评分与评论，返回去除首尾空白的评论
fn validate_content(
    ratings: Result<RatingSet>,
    comment: &str,
    policy: &ReviewPolicy,
) -> Result<(RatingSet, String)> {
    let ratings = ratings?;
    let comment = comment.trim();
    if comment.chars().count() < policy.min_comment_length {
        return Err(FeedbackError::validation(format!(
            "Comment must contain at least {} characters",
            policy.min_comment_length
        )));
    }
    Ok((ratings, comment.to_string()))
}

pub fn validate_submission(
    request: &SubmitReviewRequest,
    policy: &ReviewPolicy,
) -> Result<NewReview> {
    let (ratings, comment) = validate_content(
        RatingSet::from_raw(
            request.rating_overall,
            request.rating_clarity,
            request.rating_material,
            request.rating_pedagogy,
        ),
        &request.comment,
        policy,
    )?;

    Ok(NewReview {
        offering_id: request.offering_id,
        ratings,
        comment,
        anonymous: request.anonymous,
    })
}

/// 修改待审核评价：作者本人，且仍处于待审核
pub fn authorize_edit(actor: &Actor, review: &Review) -> Result<()> {
    if !actor.active || !review.is_owned_by(actor.id) {
        return Err(FeedbackError::forbidden("You can only edit your own reviews"));
    }
    if review.status != ModerationStatus::Pending {
        return Err(FeedbackError::invalid_transition(format!(
            "Only pending reviews can be edited, this one is {}",
            review.status
        )));
    }
    Ok(())
}

pub fn validate_edit(
    review: &Review,
    request: &UpdateReviewRequest,
    policy: &ReviewPolicy,
) -> Result<NewReview> {
    let (ratings, comment) = validate_content(
        RatingSet::from_raw(
            request.rating_overall,
            request.rating_clarity,
            request.rating_material,
            request.rating_pedagogy,
        ),
        &request.comment,
        policy,
    )?;

    Ok(NewReview {
        offering_id: review.offering_id,
        ratings,
        comment,
        anonymous: request.anonymous.unwrap_or(review.anonymous),
    })
}

/// 审核：仅管理员，决定只能是通过或驳回，且评价必须处于待审核
pub fn moderate(
    actor: &Actor,
    review: &Review,
    decision: ModerationStatus,
) -> Result<ModerationStatus> {
    if !actor.active || !actor.is_admin() {
        return Err(FeedbackError::forbidden(
            "Only administrators can moderate reviews",
        ));
    }
    if !decision.is_decision() {
        return Err(FeedbackError::validation(
            "Moderation decision must be approved or rejected",
        ));
    }
    if review.status != ModerationStatus::Pending {
        return Err(FeedbackError::invalid_transition(format!(
            "Review {} has already been moderated ({})",
            review.id, review.status
        )));
    }
    Ok(decision)
}

/// 回复：仅对象负责人，评价已通过且尚未回复
pub fn authorize_response(actor: &Actor, review: &Review, offering: &Offering) -> Result<()> {
    if !actor.active || !offering.is_responsible(actor.id) || review.offering_id != offering.id {
        return Err(FeedbackError::forbidden(
            "Only the responsible party of this offering can respond",
        ));
    }
    if review.status != ModerationStatus::Approved {
        return Err(FeedbackError::invalid_transition(
            "Only approved reviews can receive a response",
        ));
    }
    if review.response.is_some() {
        return Err(FeedbackError::already_responded(format!(
            "Review {} already has a response",
            review.id
        )));
    }
    Ok(())
}

/// 修改或撤回已有回复：原回复人，且当前仍是对象负责人
fn authorize_reply_owner(actor: &Actor, review: &Review, offering: &Offering) -> Result<()> {
    let Some(reply) = review.response.as_ref() else {
        return Err(FeedbackError::not_found(format!(
            "Review {} has no response",
            review.id
        )));
    };
    if !actor.active
        || reply.responder_id != actor.id
        || !offering.is_responsible(actor.id)
        || review.offering_id != offering.id
    {
        return Err(FeedbackError::forbidden(
            "Only the current responsible party can change their own response",
        ));
    }
    Ok(())
}

pub fn authorize_response_edit(actor: &Actor, review: &Review, offering: &Offering) -> Result<()> {
    authorize_reply_owner(actor, review, offering)
}

pub fn authorize_response_delete(
    actor: &Actor,
    review: &Review,
    offering: &Offering,
) -> Result<()> {
    authorize_reply_owner(actor, review, offering)
}

pub fn validate_response_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FeedbackError::validation("Response text must not be empty"));
    }
    Ok(text.to_string())
}

/// 删除：作者本人或管理员
pub fn authorize_delete(actor: &Actor, review: &Review) -> Result<()> {
    if actor.active && (actor.is_admin() || review.is_owned_by(actor.id)) {
        Ok(())
    } else {
        Err(FeedbackError::forbidden("You cannot delete this review"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{admin, approved, offering, review, student, teacher};
    use crate::models::reviews::entities::ReviewReply;

    fn submit(overall: i64, comment: &str) -> SubmitReviewRequest {
        SubmitReviewRequest {
            offering_id: 1,
            rating_overall: overall,
            rating_clarity: None,
            rating_material: None,
            rating_pedagogy: None,
            comment: comment.to_string(),
            anonymous: true,
        }
    }

    fn reply(responder_id: i64) -> ReviewReply {
        ReviewReply {
            text: "Thanks".to_string(),
            responder_id,
            responded_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_only_students_in_scope_may_submit() {
        let o = offering(1, "CS");
        assert!(authorize_submission(&student(1, "CS"), &o).is_ok());
        assert!(matches!(
            authorize_submission(&student(1, "Math"), &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_submission(&teacher(2), &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_submission(&admin(3), &o),
            Err(FeedbackError::Forbidden(_))
        ));

        let mut inactive = offering(2, "CS");
        inactive.is_active = false;
        assert!(authorize_submission(&student(1, "CS"), &inactive).is_err());
    }

    #[test]
    fn test_comment_length_counts_trimmed_characters() {
        let policy = ReviewPolicy::default();
        assert!(validate_submission(&submit(4, "Great course overall"), &policy).is_ok());
        assert!(matches!(
            validate_submission(&submit(4, "   too short   "), &policy),
            Err(FeedbackError::Validation(_))
        ));
        // 10 个非 ASCII 字符
        let accented = validate_submission(&submit(4, "éééééééééé"), &policy).unwrap();
        assert_eq!(accented.comment, "éééééééééé");
    }

    #[test]
    fn test_submission_trims_comment_and_keeps_flags() {
        let new = validate_submission(&submit(5, "  Clear and useful  "), &ReviewPolicy::default())
            .unwrap();
        assert_eq!(new.comment, "Clear and useful");
        assert!(new.anonymous);
        assert_eq!(new.ratings.overall.value(), 5);
    }

    #[test]
    fn test_invalid_rating_is_reported() {
        let err = validate_submission(&submit(6, "Great course overall"), &ReviewPolicy::default())
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidRating(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_moderation_happens_exactly_once() {
        let mut r = review(1, 1, 100, 4, ModerationStatus::Pending);
        let decision = moderate(&admin(9), &r, ModerationStatus::Approved).unwrap();
        r.status = decision;

        for next in [ModerationStatus::Approved, ModerationStatus::Rejected] {
            assert!(matches!(
                moderate(&admin(9), &r, next),
                Err(FeedbackError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn test_moderation_requires_admin_and_real_decision() {
        let r = review(1, 1, 100, 4, ModerationStatus::Pending);
        assert!(matches!(
            moderate(&teacher(2), &r, ModerationStatus::Approved),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            moderate(&admin(9), &r, ModerationStatus::Pending),
            Err(FeedbackError::Validation(_))
        ));
    }

    #[test]
    fn test_response_guards_in_order() {
        let mut o = offering(1, "CS");
        o.responsible_id = Some(2);

        let pending = review(1, 1, 100, 4, ModerationStatus::Pending);
        assert!(matches!(
            authorize_response(&teacher(3), &pending, &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_response(&teacher(2), &pending, &o),
            Err(FeedbackError::InvalidTransition(_))
        ));

        let mut answered = approved(2, 1, 100, 4);
        assert!(authorize_response(&teacher(2), &answered, &o).is_ok());
        answered.response = Some(reply(2));
        assert!(matches!(
            authorize_response(&teacher(2), &answered, &o),
            Err(FeedbackError::AlreadyResponded(_))
        ));
    }

    #[test]
    fn test_edit_only_by_owner_while_pending() {
        let pending = review(1, 1, 100, 4, ModerationStatus::Pending);
        assert!(authorize_edit(&student(100, "CS"), &pending).is_ok());
        assert!(matches!(
            authorize_edit(&student(101, "CS"), &pending),
            Err(FeedbackError::Forbidden(_))
        ));

        let done = approved(2, 1, 100, 4);
        assert!(matches!(
            authorize_edit(&student(100, "CS"), &done),
            Err(FeedbackError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_response_edit_only_by_responder() {
        let mut o = offering(1, "CS");
        o.responsible_id = Some(2);
        let mut r = approved(1, 1, 100, 4);
        assert!(matches!(
            authorize_response_edit(&teacher(2), &r, &o),
            Err(FeedbackError::NotFound(_))
        ));
        r.response = Some(reply(2));
        assert!(authorize_response_edit(&teacher(2), &r, &o).is_ok());
        assert!(authorize_response_delete(&teacher(2), &r, &o).is_ok());
        assert!(matches!(
            authorize_response_edit(&teacher(3), &r, &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_response_delete(&admin(9), &r, &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(validate_response_text("   ").is_err());
    }

    #[test]
    fn test_former_responsible_party_loses_reply_rights() {
        let mut o = offering(1, "CS");
        o.responsible_id = Some(3);
        let mut r = approved(1, 1, 100, 4);
        r.response = Some(reply(2));
        assert!(matches!(
            authorize_response_edit(&teacher(2), &r, &o),
            Err(FeedbackError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_response_delete(&teacher(2), &r, &o),
            Err(FeedbackError::Forbidden(_))
        ));
        // 新负责人也不能改写别人的回复
        assert!(authorize_response_edit(&teacher(3), &r, &o).is_err());
    }

    #[test]
    fn test_delete_by_owner_or_admin() {
        let r = approved(1, 1, 100, 4);
        assert!(authorize_delete(&student(100, "CS"), &r).is_ok());
        assert!(authorize_delete(&admin(9), &r).is_ok());
        assert!(authorize_delete(&student(101, "CS"), &r).is_err());
        assert!(authorize_delete(&teacher(2), &r).is_err());
    }
}
