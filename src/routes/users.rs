use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{
    ChangePasswordRequest, UpdateProfileRequest, UpdateRoleRequest, UserListParams,
};
use crate::services::UserService;

// 懒加载的全局 USER_SERVICE 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

// HTTP处理程序
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(&req, query.into_inner()).await
}

pub async fn get_user(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(&req, path.into_inner()).await
}

pub async fn activate_user(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .set_user_active(&req, path.into_inner(), true)
        .await
}

pub async fn deactivate_user(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .set_user_active(&req, path.into_inner(), false)
        .await
}

pub async fn change_role(
    req: HttpRequest,
    path: web::Path<i64>,
    role_data: web::Json<UpdateRoleRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .change_role(&req, path.into_inner(), role_data.into_inner())
        .await
}

pub async fn update_profile(
    req: HttpRequest,
    profile_data: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_profile(&req, profile_data.into_inner())
        .await
}

pub async fn change_password(
    req: HttpRequest,
    password_data: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .change_password(&req, password_data.into_inner())
        .await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireJWT)
            // 需在 /{id} 之前注册
            .route("/me", web::put().to(update_profile))
            .route("/me/password", web::put().to(change_password))
            .route(
                "",
                web::get()
                    .to(list_users)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route(
                "/{id}",
                web::get()
                    .to(get_user)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route(
                "/{id}/activate",
                web::patch()
                    .to(activate_user)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route(
                "/{id}/deactivate",
                web::patch()
                    .to(deactivate_user)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route(
                "/{id}/role",
                web::patch()
                    .to(change_role)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            ),
    );
}
