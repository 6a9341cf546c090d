use super::SeaOrmStorage;
use crate::domain::{ReviewPolicy, guard};
use crate::entity::reviews::{ActiveModel, Column, Entity as Reviews};
use crate::errors::{FeedbackError, Result};
use crate::models::reviews::{
    entities::{ModerationStatus, NewReview, Review, ReviewInsertOutcome},
    rating::Rating,
    requests::ReviewQuery,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

fn rating_column(rating: Option<Rating>) -> Option<i16> {
    rating.map(|r| i16::from(r.value()))
}

impl SeaOrmStorage {
    /// 在事务内完成重复检查与插入
    ///
    /// 已有占用名额的评价时返回 `Duplicate`，不写入任何数据。
    /// 不占用名额的已驳回评价会在同一事务内被软删除。
    pub async fn insert_review_impl(
        &self,
        reviewer_id: i64,
        review: NewReview,
        policy: &ReviewPolicy,
    ) -> Result<ReviewInsertOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| FeedbackError::database_operation(format!("开启事务失败: {e}")))?;

        let existing: Vec<Review> = Reviews::find()
            .filter(Column::ReviewerId.eq(reviewer_id))
            .filter(Column::OfferingId.eq(review.offering_id))
            .filter(Column::DeletedAt.is_null())
            .all(&txn)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询已有评价失败: {e}")))?
            .into_iter()
            .map(|m| m.into_review())
            .collect();

        if let Some(blocking) =
            guard::blocking_review(&existing, reviewer_id, review.offering_id, policy)
        {
            let duplicate = blocking.clone();
            txn.rollback()
                .await
                .map_err(|e| FeedbackError::database_operation(format!("回滚事务失败: {e}")))?;
            return Ok(ReviewInsertOutcome::Duplicate(duplicate));
        }

        let now = chrono::Utc::now().timestamp();

        let stale: Vec<i64> = existing
            .iter()
            .filter(|r| r.status == ModerationStatus::Rejected)
            .map(|r| r.id)
            .collect();
        if !stale.is_empty() {
            Reviews::update_many()
                .col_expr(Column::DeletedAt, Expr::value(now))
                .filter(Column::Id.is_in(stale))
                .exec(&txn)
                .await
                .map_err(|e| {
                    FeedbackError::database_operation(format!("清理已驳回评价失败: {e}"))
                })?;
        }

        let model = ActiveModel {
            offering_id: Set(review.offering_id),
            reviewer_id: Set(reviewer_id),
            rating_overall: Set(i16::from(review.ratings.overall.value())),
            rating_clarity: Set(rating_column(review.ratings.clarity)),
            rating_material: Set(rating_column(review.ratings.material)),
            rating_pedagogy: Set(rating_column(review.ratings.pedagogy)),
            comment: Set(review.comment),
            anonymous: Set(review.anonymous),
            status: Set(ModerationStatus::Pending.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("创建评价失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| FeedbackError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(ReviewInsertOutcome::Inserted(inserted.into_review()))
    }

    /// 通过 ID 获取评价（不含已软删除）
    pub async fn get_review_by_id_impl(&self, id: i64) -> Result<Option<Review>> {
        let result = Reviews::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询评价失败: {e}")))?;

        Ok(result.map(|m| m.into_review()))
    }

    /// 按条件列出评价，最新的在前
    pub async fn list_reviews_impl(&self, query: ReviewQuery) -> Result<Vec<Review>> {
        let mut select = Reviews::find().filter(Column::DeletedAt.is_null());

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(ids) = query.offering_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(Column::OfferingId.is_in(ids));
        }

        if let Some(reviewer_id) = query.reviewer_id {
            select = select.filter(Column::ReviewerId.eq(reviewer_id));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let result = select
            .all(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询评价列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_review()).collect())
    }

    pub async fn count_reviews_by_status_impl(&self, status: ModerationStatus) -> Result<i64> {
        let count = Reviews::find()
            .filter(Column::DeletedAt.is_null())
            .filter(Column::Status.eq(status.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("统计评价数量失败: {e}")))?;

        Ok(count as i64)
    }

    /// 修改待审核评价的内容
    ///
    /// 只有仍处于待审核状态时才会写入，否则返回 `None`。
    pub async fn update_pending_review_impl(
        &self,
        id: i64,
        content: NewReview,
    ) -> Result<Option<Review>> {
        let now = chrono::Utc::now().timestamp();

        let result = Reviews::update_many()
            .col_expr(
                Column::RatingOverall,
                Expr::value(i16::from(content.ratings.overall.value())),
            )
            .col_expr(
                Column::RatingClarity,
                Expr::value(rating_column(content.ratings.clarity)),
            )
            .col_expr(
                Column::RatingMaterial,
                Expr::value(rating_column(content.ratings.material)),
            )
            .col_expr(
                Column::RatingPedagogy,
                Expr::value(rating_column(content.ratings.pedagogy)),
            )
            .col_expr(Column::Comment, Expr::value(content.comment))
            .col_expr(Column::Anonymous, Expr::value(content.anonymous))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(ModerationStatus::Pending.to_string()))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("更新评价失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_review_by_id_impl(id).await
    }

    /// 状态迁移（比较并设置）
    ///
    /// 当前状态不是 `from` 时不做修改并返回 `None`。
    pub async fn transition_review_status_impl(
        &self,
        id: i64,
        from: ModerationStatus,
        to: ModerationStatus,
        moderator_id: i64,
    ) -> Result<Option<Review>> {
        let now = chrono::Utc::now().timestamp();

        let result = Reviews::update_many()
            .col_expr(Column::Status, Expr::value(to.to_string()))
            .col_expr(Column::ModeratedBy, Expr::value(moderator_id))
            .col_expr(Column::ModeratedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(from.to_string()))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("更新审核状态失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_review_by_id_impl(id).await
    }

    /// 写入首条回复，已有回复或评价未通过时返回 `None`
    pub async fn attach_response_impl(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>> {
        let now = chrono::Utc::now().timestamp();

        let result = Reviews::update_many()
            .col_expr(Column::ResponseText, Expr::value(text.to_string()))
            .col_expr(Column::ResponderId, Expr::value(responder_id))
            .col_expr(Column::RespondedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(ModerationStatus::Approved.to_string()))
            .filter(Column::ResponseText.is_null())
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("写入回复失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_review_by_id_impl(id).await
    }

    /// 修改回复，仅原回复人
    pub async fn update_response_impl(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>> {
        let now = chrono::Utc::now().timestamp();

        let result = Reviews::update_many()
            .col_expr(Column::ResponseText, Expr::value(text.to_string()))
            .col_expr(Column::ResponseUpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::ResponderId.eq(responder_id))
            .filter(Column::ResponseText.is_not_null())
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("更新回复失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_review_by_id_impl(id).await
    }

    /// 撤回回复，仅原回复人；撤回后评价可再次接受回复
    pub async fn delete_response_impl(&self, id: i64, responder_id: i64) -> Result<Option<Review>> {
        let result = Reviews::update_many()
            .col_expr(Column::ResponseText, Expr::value(Option::<String>::None))
            .col_expr(Column::ResponderId, Expr::value(Option::<i64>::None))
            .col_expr(Column::RespondedAt, Expr::value(Option::<i64>::None))
            .col_expr(Column::ResponseUpdatedAt, Expr::value(Option::<i64>::None))
            .filter(Column::Id.eq(id))
            .filter(Column::ResponderId.eq(responder_id))
            .filter(Column::ResponseText.is_not_null())
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("撤回回复失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_review_by_id_impl(id).await
    }

    /// 软删除评价
    pub async fn soft_delete_review_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Reviews::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("删除评价失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::{memory_storage, seed_offering, seed_user};
    use crate::domain::ReviewPolicy;
    use crate::models::reviews::entities::{ModerationStatus, NewReview, ReviewInsertOutcome};
    use crate::models::reviews::rating::RatingSet;
    use crate::models::reviews::requests::ReviewQuery;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;

    fn new_review(offering_id: i64, overall: i64) -> NewReview {
        NewReview {
            offering_id,
            ratings: RatingSet::from_raw(overall, Some(4), None, None).unwrap(),
            comment: "Clear lectures, heavy homework".to_string(),
            anonymous: true,
        }
    }

    async fn setup() -> (Arc<dyn Storage>, i64, i64, i64) {
        let storage = memory_storage().await;
        let student = seed_user(&storage, "s", UserRole::Student, Some("Informatics")).await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let offering = seed_offering(&storage, "CS101", "Informatics", None).await;
        (storage, student.id, admin.id, offering.id)
    }

    async fn inserted(
        storage: &Arc<dyn Storage>,
        reviewer: i64,
        offering: i64,
        policy: &ReviewPolicy,
    ) -> i64 {
        match storage
            .insert_review(reviewer, new_review(offering, 4), policy)
            .await
            .unwrap()
        {
            ReviewInsertOutcome::Inserted(review) => review.id,
            ReviewInsertOutcome::Duplicate(_) => panic!("unexpected duplicate"),
        }
    }

    #[tokio::test]
    async fn test_insert_then_duplicate() {
        let (storage, student, _, offering) = setup().await;
        let policy = ReviewPolicy::default();

        let id = inserted(&storage, student, offering, &policy).await;
        let review = storage.get_review_by_id(id).await.unwrap().unwrap();
        assert_eq!(review.status, ModerationStatus::Pending);
        assert_eq!(review.ratings.overall.value(), 4);
        assert_eq!(review.ratings.clarity.map(|r| r.value()), Some(4));
        assert!(review.ratings.material.is_none());

        let second = storage
            .insert_review(student, new_review(offering, 2), &policy)
            .await
            .unwrap();
        assert!(matches!(second, ReviewInsertOutcome::Duplicate(r) if r.id == id));

        let all = storage
            .list_reviews(ReviewQuery::by_reviewer(student))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_review_blocks_by_default() {
        let (storage, student, admin, offering) = setup().await;
        let policy = ReviewPolicy::default();
        let id = inserted(&storage, student, offering, &policy).await;

        storage
            .transition_review_status(
                id,
                ModerationStatus::Pending,
                ModerationStatus::Rejected,
                admin,
            )
            .await
            .unwrap()
            .unwrap();

        let again = storage
            .insert_review(student, new_review(offering, 5), &policy)
            .await
            .unwrap();
        assert!(matches!(again, ReviewInsertOutcome::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_rejected_review_replaced_when_resubmission_allowed() {
        let (storage, student, admin, offering) = setup().await;
        let policy = ReviewPolicy {
            rejected_blocks_resubmission: false,
            ..ReviewPolicy::default()
        };
        let old = inserted(&storage, student, offering, &policy).await;
        storage
            .transition_review_status(
                old,
                ModerationStatus::Pending,
                ModerationStatus::Rejected,
                admin,
            )
            .await
            .unwrap()
            .unwrap();

        let new = inserted(&storage, student, offering, &policy).await;
        assert_ne!(old, new);
        assert!(storage.get_review_by_id(old).await.unwrap().is_none());

        let remaining = storage
            .list_reviews(ReviewQuery::by_reviewer(student))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, new);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let (storage, student, admin, offering) = setup().await;
        let id = inserted(&storage, student, offering, &ReviewPolicy::default()).await;

        let approved = storage
            .transition_review_status(
                id,
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                admin,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, ModerationStatus::Approved);
        assert_eq!(approved.moderated_by, Some(admin));
        assert!(approved.moderated_at.is_some());

        let again = storage
            .transition_review_status(
                id,
                ModerationStatus::Pending,
                ModerationStatus::Rejected,
                admin,
            )
            .await
            .unwrap();
        assert!(again.is_none());
        let current = storage.get_review_by_id(id).await.unwrap().unwrap();
        assert_eq!(current.status, ModerationStatus::Approved);
    }

    #[tokio::test]
    async fn test_update_only_while_pending() {
        let (storage, student, admin, offering) = setup().await;
        let id = inserted(&storage, student, offering, &ReviewPolicy::default()).await;

        let mut content = new_review(offering, 1);
        content.comment = "Changed my mind entirely".to_string();
        content.anonymous = false;
        let updated = storage
            .update_pending_review(id, content.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.ratings.overall.value(), 1);
        assert!(!updated.anonymous);

        storage
            .transition_review_status(
                id,
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                admin,
            )
            .await
            .unwrap();
        assert!(storage.update_pending_review(id, content).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_response_per_review() {
        let (storage, student, admin, offering) = setup().await;
        let teacher = seed_user(&storage, "t", UserRole::Teacher, None).await;
        let id = inserted(&storage, student, offering, &ReviewPolicy::default()).await;

        // 未通过的评价不能回复
        assert!(storage.attach_response(id, teacher.id, "Thanks").await.unwrap().is_none());

        storage
            .transition_review_status(
                id,
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                admin,
            )
            .await
            .unwrap();

        let replied = storage
            .attach_response(id, teacher.id, "Thanks for the feedback")
            .await
            .unwrap()
            .unwrap();
        let reply = replied.response.unwrap();
        assert_eq!(reply.responder_id, teacher.id);
        assert!(reply.updated_at.is_none());

        assert!(storage.attach_response(id, teacher.id, "Second").await.unwrap().is_none());

        assert!(storage.update_response(id, admin, "Hijack").await.unwrap().is_none());
        let edited = storage
            .update_response(id, teacher.id, "Updated reply")
            .await
            .unwrap()
            .unwrap();
        let reply = edited.response.unwrap();
        assert_eq!(reply.text, "Updated reply");
        assert!(reply.updated_at.is_some());

        assert!(storage.delete_response(id, admin).await.unwrap().is_none());
        let cleared = storage.delete_response(id, teacher.id).await.unwrap().unwrap();
        assert!(cleared.response.is_none());
        assert_eq!(cleared.status, ModerationStatus::Approved);
        assert!(storage.delete_response(id, teacher.id).await.unwrap().is_none());

        let again = storage
            .attach_response(id, teacher.id, "Second thoughts")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.response.unwrap().text, "Second thoughts");
    }

    #[tokio::test]
    async fn test_soft_delete_and_queries() {
        let (storage, student, admin, offering) = setup().await;
        let other = seed_user(&storage, "s2", UserRole::Student, Some("Informatics")).await;
        let policy = ReviewPolicy::default();
        let first = inserted(&storage, student, offering, &policy).await;
        let second = inserted(&storage, other.id, offering, &policy).await;

        storage
            .transition_review_status(
                first,
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                admin,
            )
            .await
            .unwrap();

        assert_eq!(
            storage.count_reviews_by_status(ModerationStatus::Pending).await.unwrap(),
            1
        );
        let approved = storage
            .list_reviews(ReviewQuery::approved_for(vec![offering]))
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert!(storage
            .list_reviews(ReviewQuery::approved_for(Vec::new()))
            .await
            .unwrap()
            .is_empty());

        let newest_first = storage
            .list_reviews(ReviewQuery::by_offering(offering))
            .await
            .unwrap();
        assert_eq!(newest_first.len(), 2);
        assert_eq!(newest_first[0].id, second);

        let limited = storage
            .list_reviews(ReviewQuery::by_offering(offering).limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        assert!(storage.soft_delete_review(second).await.unwrap());
        assert!(!storage.soft_delete_review(second).await.unwrap());
        assert!(storage.get_review_by_id(second).await.unwrap().is_none());
        assert_eq!(
            storage.count_reviews_by_status(ModerationStatus::Pending).await.unwrap(),
            0
        );

        // 软删除后可以重新提交
        let resubmitted = storage
            .insert_review(other.id, new_review(offering, 3), &policy)
            .await
            .unwrap();
        assert!(matches!(resubmitted, ReviewInsertOutcome::Inserted(_)));
    }
}
