use std::sync::Arc;

use crate::domain::ReviewPolicy;
use crate::models::{
    offerings::{
        entities::Offering,
        requests::{CreateOfferingRequest, OfferingListQuery, UpdateOfferingRequest},
    },
    reviews::{
        entities::{ModerationStatus, NewReview, Review, ReviewInsertOutcome},
        requests::ReviewQuery,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 批量获取用户
    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;
    // 用户总数
    async fn count_users(&self) -> Result<u64>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 分页列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;

    /// 课程/服务管理方法
    // 代码已被占用时返回 None
    async fn create_offering(&self, offering: CreateOfferingRequest) -> Result<Option<Offering>>;
    async fn get_offering_by_id(&self, id: i64) -> Result<Option<Offering>>;
    async fn get_offering_by_code(&self, code: &str) -> Result<Option<Offering>>;
    async fn get_offerings_by_ids(&self, ids: &[i64]) -> Result<Vec<Offering>>;
    // 按条件列出，不做可见性过滤
    async fn list_offerings(&self, query: OfferingListQuery) -> Result<Vec<Offering>>;
    async fn update_offering(
        &self,
        id: i64,
        update: UpdateOfferingRequest,
    ) -> Result<Option<Offering>>;
    // 启用/停用（软删除）
    async fn set_offering_active(&self, id: i64, active: bool) -> Result<Option<Offering>>;

    /// 评价管理方法
    // 在同一事务内完成重复检查与插入
    async fn insert_review(
        &self,
        reviewer_id: i64,
        review: NewReview,
        policy: &ReviewPolicy,
    ) -> Result<ReviewInsertOutcome>;
    // 获取未删除的评价
    async fn get_review_by_id(&self, id: i64) -> Result<Option<Review>>;
    // 按条件列出未删除的评价，按创建时间倒序
    async fn list_reviews(&self, query: ReviewQuery) -> Result<Vec<Review>>;
    async fn count_reviews_by_status(&self, status: ModerationStatus) -> Result<i64>;
    // 修改待审核评价；评价已不在待审核状态时返回 None
    async fn update_pending_review(&self, id: i64, content: NewReview) -> Result<Option<Review>>;
    // 比较并交换审核状态；当前状态不是 from 时返回 None
    async fn transition_review_status(
        &self,
        id: i64,
        from: ModerationStatus,
        to: ModerationStatus,
        moderator_id: i64,
    ) -> Result<Option<Review>>;
    // 附加回复；评价未通过或已有回复时返回 None
    async fn attach_response(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>>;
    // 修改回复；回复不存在或不属于 responder_id 时返回 None
    async fn update_response(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>>;
    // 撤回回复；回复不存在或不属于 responder_id 时返回 None
    async fn delete_response(&self, id: i64, responder_id: i64) -> Result<Option<Review>>;
    async fn soft_delete_review(&self, id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
