//! 可见性策略
//!
//! 所有读取路径（目录、评价列表、统计）都经过这里过滤。
//! 超出范围的读取返回空结果，只有写操作才会报 Forbidden。

use crate::models::offerings::entities::Offering;
use crate::models::reviews::entities::Review;
use crate::models::reviews::responses::{ReviewReplyView, ReviewView};
use crate::models::users::entities::{Actor, User, UserRole};

/// 判断参与者能否看到该对象
///
/// - 管理员：全部（含已停用）
/// - 教师：全部启用的对象
/// - 学生：启用且院系完全一致（去除首尾空白后比较）；未设置院系则什么都看不到
pub fn can_view_offering(actor: &Actor, offering: &Offering) -> bool {
    if !actor.active {
        return false;
    }
    match actor.role {
        UserRole::Admin => true,
        UserRole::Teacher => offering.is_active,
        UserRole::Student => {
            offering.is_active
                && actor
                    .department()
                    .is_some_and(|dept| dept == offering.department.trim())
        }
    }
}

pub fn visible_offerings<I>(actor: &Actor, offerings: I) -> Vec<Offering>
where
    I: IntoIterator<Item = Offering>,
{
    offerings
        .into_iter()
        .filter(|o| can_view_offering(actor, o))
        .collect()
}

/// 单条评价是否可见
///
/// 作者本人总能看到自己未删除的评价，即便对象已停用或不在其范围内；
/// 其他人需要对象可见，且评价已通过（管理员不受此限）。
pub fn can_view_review(actor: &Actor, offering: &Offering, review: &Review) -> bool {
    if !actor.active || review.is_deleted() || review.offering_id != offering.id {
        return false;
    }
    if review.is_owned_by(actor.id) {
        return true;
    }
    can_view_offering(actor, offering) && (actor.is_admin() || review.is_approved())
}

/// 某对象下参与者可见的评价，逐条套用 `can_view_review`
pub fn visible_reviews(actor: &Actor, offering: &Offering, reviews: Vec<Review>) -> Vec<Review> {
    reviews
        .into_iter()
        .filter(|r| can_view_review(actor, offering, r))
        .collect()
}

/// 评价对外投影
///
/// 匿名评价只对管理员暴露评价人身份，作者本人也只能通过 `is_own` 识别
pub fn project_review(
    actor: &Actor,
    review: &Review,
    reviewer: Option<&User>,
    responder: Option<&User>,
    offering: Option<&Offering>,
) -> ReviewView {
    let reveal_identity = !review.anonymous || actor.is_admin();

    ReviewView {
        id: review.id,
        offering_id: review.offering_id,
        offering: offering.map(Offering::brief),
        reviewer_id: reveal_identity.then_some(review.reviewer_id),
        reviewer_name: if reveal_identity {
            reviewer.map(|u| u.public_name().to_string())
        } else {
            None
        },
        anonymous: review.anonymous,
        is_own: review.is_owned_by(actor.id),
        ratings: review.ratings,
        comment: review.comment.clone(),
        status: review.status,
        moderated_at: review.moderated_at,
        response: review.response.as_ref().map(|reply| ReviewReplyView {
            text: reply.text.clone(),
            responder_id: reply.responder_id,
            responder_name: responder
                .filter(|u| u.id == reply.responder_id)
                .map(|u| u.public_name().to_string()),
            responded_at: reply.responded_at,
            updated_at: reply.updated_at,
        }),
        created_at: review.created_at,
        updated_at: review.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{admin, approved, offering, review, student, teacher};
    use crate::models::reviews::entities::ModerationStatus;
    use crate::models::users::entities::UserStatus;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            department: None,
            display_name: Some(format!("User {id}")),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_student_sees_exactly_own_department() {
        let catalog = vec![offering(1, "CS"), offering(2, "Math"), offering(3, "CS")];
        let cs = student(10, "CS");
        let visible: Vec<i64> = visible_offerings(&cs, catalog.clone())
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(visible, vec![1, 3]);

        for o in &catalog {
            assert_eq!(can_view_offering(&cs, o), o.department == "CS");
        }
    }

    #[test]
    fn test_department_match_is_exact_after_trim() {
        let o = offering(1, "CS ");
        assert!(can_view_offering(&student(1, " CS"), &o));
        assert!(!can_view_offering(&student(1, "cs"), &o));
        assert!(!can_view_offering(&student(1, "CS-2"), &o));
    }

    #[test]
    fn test_student_without_department_sees_nothing() {
        let mut s = student(1, "CS");
        s.department = None;
        assert!(!can_view_offering(&s, &offering(1, "CS")));
    }

    #[test]
    fn test_inactive_offering_only_for_admin() {
        let mut o = offering(1, "CS");
        o.is_active = false;
        assert!(can_view_offering(&admin(1), &o));
        assert!(!can_view_offering(&teacher(2), &o));
        assert!(!can_view_offering(&student(3, "CS"), &o));
    }

    #[test]
    fn test_inactive_actor_sees_nothing() {
        let mut a = admin(1);
        a.active = false;
        assert!(!can_view_offering(&a, &offering(1, "CS")));
    }

    #[test]
    fn test_review_listing_by_role() {
        let o = offering(1, "CS");
        let reviews = vec![
            approved(1, 1, 100, 5),
            review(2, 1, 101, 3, ModerationStatus::Pending),
            review(3, 1, 102, 1, ModerationStatus::Rejected),
        ];

        let ids = |actor: &Actor| -> Vec<i64> {
            visible_reviews(actor, &o, reviews.clone())
                .iter()
                .map(|r| r.id)
                .collect()
        };

        assert_eq!(ids(&admin(1)), vec![1, 2, 3]);
        assert_eq!(ids(&teacher(2)), vec![1]);
        assert_eq!(ids(&student(101, "CS")), vec![1, 2]);
        assert_eq!(ids(&student(103, "CS")), vec![1]);
        assert!(ids(&student(104, "Math")).is_empty());
    }

    #[test]
    fn test_owner_sees_own_review_outside_scope() {
        let mut o = offering(1, "CS");
        o.is_active = false;
        let own = review(5, 1, 100, 4, ModerationStatus::Rejected);
        assert!(can_view_review(&student(100, "CS"), &o, &own));
        assert!(!can_view_review(&student(101, "CS"), &o, &own));
    }

    #[test]
    fn test_list_and_single_read_agree_for_owner() {
        let mut o = offering(1, "CS");
        o.is_active = false;
        let reviews = vec![
            review(5, 1, 100, 4, ModerationStatus::Pending),
            approved(6, 1, 101, 5),
        ];
        let owner = student(100, "CS");

        let listed: Vec<i64> = visible_reviews(&owner, &o, reviews.clone())
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![5]);
        for r in &reviews {
            assert_eq!(
                can_view_review(&owner, &o, r),
                listed.contains(&r.id),
                "review {}",
                r.id
            );
        }
    }

    #[test]
    fn test_anonymous_projection_hides_identity_except_for_admin() {
        let mut r = approved(1, 1, 100, 4);
        r.anonymous = true;
        let author = user(100, UserRole::Student);

        for viewer in [teacher(2), student(3, "CS"), student(100, "CS")] {
            let view = project_review(&viewer, &r, Some(&author), None, None);
            assert_eq!(view.reviewer_id, None);
            assert_eq!(view.reviewer_name, None);
        }

        let own = project_review(&student(100, "CS"), &r, Some(&author), None, None);
        assert!(own.is_own);

        let view = project_review(&admin(9), &r, Some(&author), None, None);
        assert_eq!(view.reviewer_id, Some(100));
        assert_eq!(view.reviewer_name.as_deref(), Some("User 100"));
        assert!(!view.is_own);
    }

    #[test]
    fn test_named_projection_exposes_identity() {
        let r = approved(1, 1, 100, 4);
        let author = user(100, UserRole::Student);
        let view = project_review(&student(3, "CS"), &r, Some(&author), None, None);
        assert_eq!(view.reviewer_id, Some(100));
        assert_eq!(view.reviewer_name.as_deref(), Some("User 100"));
    }
}
