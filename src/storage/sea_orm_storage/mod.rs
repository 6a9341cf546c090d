//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod offerings;
mod reviews;
mod users;

use crate::config::AppConfig;
use crate::errors::{FeedbackError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 根据全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| FeedbackError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存库不支持 WAL
        if !url.contains(":memory:") {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| FeedbackError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(5.min(pool_size))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| FeedbackError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(FeedbackError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        self.get_users_by_ids_impl(ids).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    // 课程/服务模块
    async fn create_offering(&self, offering: CreateOfferingRequest) -> Result<Option<Offering>> {
        self.create_offering_impl(offering).await
    }

    async fn get_offering_by_id(&self, id: i64) -> Result<Option<Offering>> {
        self.get_offering_by_id_impl(id).await
    }

    async fn get_offering_by_code(&self, code: &str) -> Result<Option<Offering>> {
        self.get_offering_by_code_impl(code).await
    }

    async fn get_offerings_by_ids(&self, ids: &[i64]) -> Result<Vec<Offering>> {
        self.get_offerings_by_ids_impl(ids).await
    }

    async fn list_offerings(&self, query: OfferingListQuery) -> Result<Vec<Offering>> {
        self.list_offerings_impl(query).await
    }

    async fn update_offering(
        &self,
        id: i64,
        update: UpdateOfferingRequest,
    ) -> Result<Option<Offering>> {
        self.update_offering_impl(id, update).await
    }

    async fn set_offering_active(&self, id: i64, active: bool) -> Result<Option<Offering>> {
        self.set_offering_active_impl(id, active).await
    }

    // 评价模块
    async fn insert_review(
        &self,
        reviewer_id: i64,
        review: NewReview,
        policy: &ReviewPolicy,
    ) -> Result<ReviewInsertOutcome> {
        self.insert_review_impl(reviewer_id, review, policy).await
    }

    async fn get_review_by_id(&self, id: i64) -> Result<Option<Review>> {
        self.get_review_by_id_impl(id).await
    }

    async fn list_reviews(&self, query: ReviewQuery) -> Result<Vec<Review>> {
        self.list_reviews_impl(query).await
    }

    async fn count_reviews_by_status(&self, status: ModerationStatus) -> Result<i64> {
        self.count_reviews_by_status_impl(status).await
    }

    async fn update_pending_review(&self, id: i64, content: NewReview) -> Result<Option<Review>> {
        self.update_pending_review_impl(id, content).await
    }

    async fn transition_review_status(
        &self,
        id: i64,
        from: ModerationStatus,
        to: ModerationStatus,
        moderator_id: i64,
    ) -> Result<Option<Review>> {
        self.transition_review_status_impl(id, from, to, moderator_id)
            .await
    }

    async fn attach_response(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>> {
        self.attach_response_impl(id, responder_id, text).await
    }

    async fn update_response(
        &self,
        id: i64,
        responder_id: i64,
        text: &str,
    ) -> Result<Option<Review>> {
        self.update_response_impl(id, responder_id, text).await
    }

    async fn delete_response(&self, id: i64, responder_id: i64) -> Result<Option<Review>> {
        self.delete_response_impl(id, responder_id).await
    }

    async fn soft_delete_review(&self, id: i64) -> Result<bool> {
        self.soft_delete_review_impl(id).await
    }
}
