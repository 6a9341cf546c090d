pub mod list;
pub mod manage;
pub mod profile;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::debug;

use crate::cache::ObjectCache;
use crate::errors::{FeedbackError, Result};
use crate::middlewares::require_jwt::user_cache_key;
use crate::models::users::entities::{Actor, UserRole};
use crate::models::users::requests::{
    ChangePasswordRequest, UpdateProfileRequest, UpdateRoleRequest, UserListParams,
};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    // 管理员分页查询用户
    pub async fn list_users(
        &self,
        request: &HttpRequest,
        params: UserListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_users(self, request, params).await
    }

    pub async fn get_user(&self, request: &HttpRequest, user_id: i64) -> ActixResult<HttpResponse> {
        manage::handle_get_user(self, request, user_id).await
    }

    // 启用/停用账号
    pub async fn set_user_active(
        &self,
        request: &HttpRequest,
        user_id: i64,
        active: bool,
    ) -> ActixResult<HttpResponse> {
        manage::handle_set_active(self, request, user_id, active).await
    }

    pub async fn change_role(
        &self,
        request: &HttpRequest,
        user_id: i64,
        role_request: UpdateRoleRequest,
    ) -> ActixResult<HttpResponse> {
        manage::handle_change_role(self, request, user_id, role_request).await
    }

    // 当前用户修改资料
    pub async fn update_profile(
        &self,
        request: &HttpRequest,
        profile_request: UpdateProfileRequest,
    ) -> ActixResult<HttpResponse> {
        profile::handle_update_profile(self, request, profile_request).await
    }

    pub async fn change_password(
        &self,
        request: &HttpRequest,
        password_request: ChangePasswordRequest,
    ) -> ActixResult<HttpResponse> {
        profile::handle_change_password(self, request, password_request).await
    }
}

pub(crate) fn require_admin(actor: &Actor) -> Result<()> {
    if actor.active && actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(FeedbackError::forbidden("Only administrators can manage users"))
    }
}

/// 用户记录变更后清除认证缓存，使下一次请求读到最新状态
pub(crate) async fn evict_cached_user(cache: Option<&Arc<dyn ObjectCache>>, user_id: i64) {
    if let Some(cache) = cache {
        cache.remove(&user_cache_key(user_id)).await;
        debug!("Evicted cached user {}", user_id);
    }
}
