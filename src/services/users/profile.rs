//! 当前用户维护自己的资料与密码

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{UserService, evict_cached_user};
use crate::cache::ObjectCache;
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::users::entities::{Actor, User};
use crate::models::users::requests::{
    ChangePasswordRequest, UpdateProfileRequest, UpdateUserRequest,
};
use crate::models::users::responses::UserResponse;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{validate_email, validate_password};

async fn load_self(storage: &Arc<dyn Storage>, actor: &Actor) -> Result<User> {
    storage
        .get_user_by_id(actor.id)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("User {} not found", actor.id)))
}

pub(crate) async fn update_profile(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    request: UpdateProfileRequest,
) -> Result<User> {
    let current = load_self(storage, actor).await?;
    let mut update = UpdateUserRequest::default();

    if let Some(display_name) = request.display_name {
        let display_name = display_name.trim();
        if display_name.chars().count() > 64 {
            return Err(FeedbackError::validation(
                "Display name must be at most 64 characters",
            ));
        }
        // 空白昵称视为清除
        update.display_name = Some(Some(display_name.to_string()).filter(|n| !n.is_empty()));
    }

    if let Some(email) = request.email {
        let email = email.trim().to_string();
        if email != current.email {
            validate_email(&email).map_err(FeedbackError::validation)?;
            if storage.get_user_by_email(&email).await?.is_some() {
                return Err(FeedbackError::validation("Email is already in use"));
            }
            update.email = Some(email);
        }
    }

    let user = storage
        .update_user(actor.id, update)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("User {} not found", actor.id)))?;
    evict_cached_user(cache, actor.id).await;
    Ok(user)
}

pub(crate) async fn change_password(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    request: ChangePasswordRequest,
) -> Result<()> {
    let current = load_self(storage, actor).await?;
    if !verify_password(&request.current_password, &current.password_hash) {
        return Err(FeedbackError::validation("Current password is incorrect"));
    }

    let policy = validate_password(&request.new_password);
    if !policy.is_valid {
        return Err(FeedbackError::validation(policy.error_message()));
    }

    let password_hash = hash_password(&request.new_password)?;
    storage
        .update_user(
            actor.id,
            UpdateUserRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("User {} not found", actor.id)))?;
    evict_cached_user(cache, actor.id).await;

    info!("User {} changed password", actor.id);
    Ok(())
}

pub async fn handle_update_profile(
    service: &UserService,
    request: &HttpRequest,
    profile_request: UpdateProfileRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);
    let result = match current_actor(request) {
        Ok(actor) => update_profile(&storage, cache.as_ref(), &actor, profile_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "Profile updated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}

pub async fn handle_change_password(
    service: &UserService,
    request: &HttpRequest,
    password_request: ChangePasswordRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);
    let result = match current_actor(request) {
        Ok(actor) => change_password(&storage, cache.as_ref(), &actor, password_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Password changed successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_user};

    async fn user_with_password(storage: &Arc<dyn Storage>, password: &str) -> User {
        storage
            .create_user(CreateUserRequest {
                username: "pat".to_string(),
                email: "pat@example.com".to_string(),
                password: hash_password(password).unwrap(),
                role: UserRole::Student,
                department: Some("CS".to_string()),
                display_name: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_profile_sets_and_clears_display_name() {
        let storage = memory_storage().await;
        let user = seed_user(&storage, "stu", UserRole::Student, Some("CS")).await;

        let updated = update_profile(
            &storage,
            None,
            &user.actor(),
            UpdateProfileRequest {
                display_name: Some("  Stu Dent ".to_string()),
                email: Some("new@example.com".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Stu Dent"));
        assert_eq!(updated.email, "new@example.com");

        let cleared = update_profile(
            &storage,
            None,
            &user.actor(),
            UpdateProfileRequest {
                display_name: Some("   ".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();
        assert!(cleared.display_name.is_none());
        assert_eq!(cleared.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_or_malformed_email() {
        let storage = memory_storage().await;
        let other = seed_user(&storage, "other", UserRole::Student, None).await;
        let user = seed_user(&storage, "stu", UserRole::Student, None).await;

        let err = update_profile(
            &storage,
            None,
            &user.actor(),
            UpdateProfileRequest {
                display_name: None,
                email: Some(other.email.clone()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));

        let err = update_profile(
            &storage,
            None,
            &user.actor(),
            UpdateProfileRequest {
                display_name: None,
                email: Some("not-an-email".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));

        // 保持原邮箱不算冲突
        let same = update_profile(
            &storage,
            None,
            &user.actor(),
            UpdateProfileRequest {
                display_name: None,
                email: Some(user.email.clone()),
            },
        )
        .await
        .unwrap();
        assert_eq!(same.email, user.email);
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let storage = memory_storage().await;
        let user = user_with_password(&storage, "Str0ngPass!").await;

        let err = change_password(
            &storage,
            None,
            &user.actor(),
            ChangePasswordRequest {
                current_password: "Wrong1Pass".to_string(),
                new_password: "N3wSecret!".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));

        let err = change_password(
            &storage,
            None,
            &user.actor(),
            ChangePasswordRequest {
                current_password: "Str0ngPass!".to_string(),
                new_password: "short".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));

        change_password(
            &storage,
            None,
            &user.actor(),
            ChangePasswordRequest {
                current_password: "Str0ngPass!".to_string(),
                new_password: "N3wSecret!".to_string(),
            },
        )
        .await
        .unwrap();

        let reloaded = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("N3wSecret!", &reloaded.password_hash));
        assert!(!verify_password("Str0ngPass!", &reloaded.password_hash));
    }
}
