use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{FeedbackError, Result};
use crate::models::common::PaginationInfo;
use crate::models::users::{
    entities::{User, UserStatus},
    requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
    responses::UserListResponse,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let department = req
            .department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            department: Set(department),
            display_name: Set(req.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名或邮箱获取用户
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        let result = Users::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 批量获取用户（用于评价列表的展示名）
    pub async fn get_users_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Users::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("批量查询用户失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_user()).collect())
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                FeedbackError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.max(1) as u64;
        let size = query.size.clamp(1, 100) as u64;

        let mut select = Users::find();

        if let Some(search) = query.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(search))
                    .add(Column::Email.contains(search))
                    .add(Column::DisplayName.contains(search)),
            );
        }

        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(department) = query.department.as_deref().map(str::trim)
            && !department.is_empty()
        {
            select = select.filter(Column::Department.eq(department));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户总数失败: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }

    /// 更新用户信息
    ///
    /// 用户不存在时返回 None；邮箱与他人冲突时返回校验错误。
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(password_hash) = update.password_hash {
            model.password_hash = Set(password_hash);
        }

        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        if let Some(display_name) = update.display_name {
            model.display_name = Set(display_name);
        }

        match model.update(&self.db).await {
            Ok(_) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(FeedbackError::validation("Email is already in use"));
            }
            Err(e) => {
                return Err(FeedbackError::database_operation(format!(
                    "更新用户失败: {e}"
                )));
            }
        }

        self.get_user_by_id_impl(id).await
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        let count = Users::find()
            .count(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("统计用户数量失败: {e}")))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{memory_storage, seed_user};
    use crate::errors::FeedbackError;
    use crate::models::users::entities::{UserRole, UserStatus};
    use crate::models::users::requests::{UpdateUserRequest, UserListQuery};
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "alice", UserRole::Student, Some("  Physics ")).await;

        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.department.as_deref(), Some("Physics"));

        let by_name = storage.get_user_by_username("alice").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(user.id));

        let by_email = storage
            .get_user_by_username_or_email("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));

        assert!(storage.get_user_by_id(user.id + 100).await.unwrap().is_none());
        assert_eq!(storage.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_department_is_stored_as_none() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "bob", UserRole::Teacher, Some("   ")).await;
        assert!(user.department.is_none());
    }

    #[tokio::test]
    async fn test_get_users_by_ids() {
        let storage = memory_storage().await;
        let a = seed_user(&storage, "a", UserRole::Student, None).await;
        let b = seed_user(&storage, "b", UserRole::Teacher, None).await;

        let mut ids: Vec<i64> = storage
            .get_users_by_ids(&[a.id, b.id, 999])
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![a.id, b.id]);
        assert!(storage.get_users_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_users_filters_and_paginates() {
        let storage = memory_storage().await;
        seed_user(&storage, "amy", UserRole::Student, Some("CS")).await;
        seed_user(&storage, "ben", UserRole::Student, Some("Math")).await;
        let tom = seed_user(&storage, "tom", UserRole::Teacher, Some("CS")).await;

        let students = storage
            .list_users_with_pagination(UserListQuery {
                page: 1,
                size: 10,
                role: Some(UserRole::Student),
                status: None,
                department: None,
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 2);

        let cs_teachers = storage
            .list_users_with_pagination(UserListQuery {
                page: 1,
                size: 10,
                role: None,
                status: None,
                department: Some("CS".to_string()),
                search: Some("tom".to_string()),
            })
            .await
            .unwrap();
        let ids: Vec<i64> = cs_teachers.items.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![tom.id]);

        let second_page = storage
            .list_users_with_pagination(UserListQuery {
                page: 2,
                size: 2,
                role: None,
                status: None,
                department: None,
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(second_page.items.len(), 1);
        assert_eq!(second_page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_update_user_applies_only_given_fields() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "dina", UserRole::Student, None).await;

        let updated = storage
            .update_user(
                user.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Inactive),
                    display_name: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, UserStatus::Inactive);
        assert!(updated.display_name.is_none());
        assert_eq!(updated.role, UserRole::Student);
        assert_eq!(updated.email, user.email);

        assert!(
            storage
                .update_user(user.id + 100, UpdateUserRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_email() {
        let storage = memory_storage().await;
        let first = seed_user(&storage, "eve", UserRole::Student, None).await;
        let second = seed_user(&storage, "fay", UserRole::Student, None).await;

        let err = storage
            .update_user(
                second.id,
                UpdateUserRequest {
                    email: Some(first.email.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "carol", UserRole::Admin, None).await;
        assert!(user.last_login.is_none());

        assert!(storage.update_last_login(user.id).await.unwrap());
        let reloaded = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());
        assert!(!storage.update_last_login(user.id + 1).await.unwrap());
    }
}
