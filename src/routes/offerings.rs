use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::offerings::requests::{
    CreateOfferingRequest, OfferingListParams, UpdateOfferingRequest,
};
use crate::models::reviews::requests::ReviewListParams;
use crate::models::users::entities::UserRole;
use crate::services::{OfferingService, ReviewService};

// 懒加载的全局 OFFERING_SERVICE 实例
static OFFERING_SERVICE: Lazy<OfferingService> = Lazy::new(OfferingService::new_lazy);
static REVIEW_SERVICE: Lazy<ReviewService> = Lazy::new(ReviewService::new_lazy);

// HTTP处理程序
pub async fn list_offerings(
    req: HttpRequest,
    query: web::Query<OfferingListParams>,
) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE
        .list_offerings(&req, query.into_inner())
        .await
}

pub async fn list_departments(req: HttpRequest) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE.list_departments(&req).await
}

pub async fn get_offering(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE.get_offering(&req, path.into_inner()).await
}

pub async fn list_offering_reviews(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<ReviewListParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .list_offering_reviews(&req, path.into_inner(), query.into_inner())
        .await
}

pub async fn create_offering(
    req: HttpRequest,
    offering_data: web::Json<CreateOfferingRequest>,
) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE
        .create_offering(&req, offering_data.into_inner())
        .await
}

pub async fn update_offering(
    req: HttpRequest,
    path: web::Path<i64>,
    update_data: web::Json<UpdateOfferingRequest>,
) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE
        .update_offering(&req, path.into_inner(), update_data.into_inner())
        .await
}

pub async fn deactivate_offering(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE
        .deactivate_offering(&req, path.into_inner())
        .await
}

pub async fn activate_offering(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    OFFERING_SERVICE
        .activate_offering(&req, path.into_inner())
        .await
}

// 配置路由
pub fn configure_offering_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/offerings")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(web::get().to(list_offerings)).route(
                    web::post()
                        .to(create_offering)
                        .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
                ),
            )
            // 需在 /{id} 之前注册
            .route("/departments", web::get().to(list_departments))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_offering))
                    .route(
                        web::put()
                            .to(update_offering)
                            .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
                    )
                    .route(
                        web::delete()
                            .to(deactivate_offering)
                            .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
                    ),
            )
            .route(
                "/{id}/activate",
                web::patch()
                    .to(activate_offering)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route("/{id}/reviews", web::get().to(list_offering_reviews)),
    );
}
