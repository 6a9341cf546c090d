use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{UserService, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::users::entities::Actor;
use crate::models::users::requests::{UserListParams, UserListQuery};
use crate::models::users::responses::UserListResponse;
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn list_users(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: UserListParams,
) -> Result<UserListResponse> {
    require_admin(actor)?;
    storage
        .list_users_with_pagination(UserListQuery::from(params))
        .await
}

pub async fn handle_list_users(
    service: &UserService,
    request: &HttpRequest,
    params: UserListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => list_users(&storage, &actor, params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "User list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::USER)),
    }
}
