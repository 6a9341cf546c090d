//! 管理员维护账号：查看、启停用与角色调整

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{UserService, evict_cached_user, require_admin};
use crate::cache::ObjectCache;
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::users::entities::{Actor, User, UserStatus};
use crate::models::users::requests::{UpdateRoleRequest, UpdateUserRequest};
use crate::models::users::responses::UserResponse;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

fn user_not_found(user_id: i64) -> FeedbackError {
    FeedbackError::not_found(format!("User {user_id} not found"))
}

pub(crate) async fn get_user(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    user_id: i64,
) -> Result<User> {
    require_admin(actor)?;
    storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))
}

pub(crate) async fn set_active(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    user_id: i64,
    active: bool,
) -> Result<User> {
    require_admin(actor)?;
    if !active && user_id == actor.id {
        return Err(FeedbackError::validation(
            "Administrators cannot deactivate their own account",
        ));
    }

    let status = if active {
        UserStatus::Active
    } else {
        UserStatus::Inactive
    };
    let user = storage
        .update_user(
            user_id,
            UpdateUserRequest {
                status: Some(status),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| user_not_found(user_id))?;
    evict_cached_user(cache, user_id).await;

    info!(
        "User {} {} by admin {}",
        user.username,
        if active { "activated" } else { "deactivated" },
        actor.id
    );
    Ok(user)
}

pub(crate) async fn change_role(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    user_id: i64,
    request: UpdateRoleRequest,
) -> Result<User> {
    require_admin(actor)?;
    if user_id == actor.id {
        return Err(FeedbackError::validation(
            "Administrators cannot change their own role",
        ));
    }

    let user = storage
        .update_user(
            user_id,
            UpdateUserRequest {
                role: Some(request.role),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| user_not_found(user_id))?;
    evict_cached_user(cache, user_id).await;

    info!(
        "User {} role changed to {} by admin {}",
        user.username, user.role, actor.id
    );
    Ok(user)
}

pub async fn handle_get_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => get_user(&storage, &actor, user_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}

pub async fn handle_set_active(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
    active: bool,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);
    let result = match current_actor(request) {
        Ok(actor) => set_active(&storage, cache.as_ref(), &actor, user_id, active).await,
        Err(e) => Err(e),
    };

    let message = if active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    match result {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse { user }, message))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}

pub async fn handle_change_role(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
    role_request: UpdateRoleRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);
    let result = match current_actor(request) {
        Ok(actor) => change_role(&storage, cache.as_ref(), &actor, user_id, role_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User role updated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}
