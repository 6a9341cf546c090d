use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reviews::requests::{
    ModerateReviewRequest, RecentReviewsParams, ReviewCheckParams, ReviewListParams,
    ReviewResponseRequest, SubmitReviewRequest, UpdateReviewRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ReviewService;

// 懒加载的全局 REVIEW_SERVICE 实例
static REVIEW_SERVICE: Lazy<ReviewService> = Lazy::new(ReviewService::new_lazy);

// HTTP处理程序
pub async fn submit_review(
    req: HttpRequest,
    review_data: web::Json<SubmitReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .submit_review(&req, review_data.into_inner())
        .await
}

pub async fn get_review(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.get_review(&req, path.into_inner()).await
}

pub async fn update_review(
    req: HttpRequest,
    path: web::Path<i64>,
    review_data: web::Json<UpdateReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .update_review(&req, path.into_inner(), review_data.into_inner())
        .await
}

pub async fn delete_review(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.delete_review(&req, path.into_inner()).await
}

pub async fn moderate_review(
    req: HttpRequest,
    path: web::Path<i64>,
    moderate_data: web::Json<ModerateReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .moderate_review(&req, path.into_inner(), moderate_data.into_inner())
        .await
}

pub async fn attach_response(
    req: HttpRequest,
    path: web::Path<i64>,
    response_data: web::Json<ReviewResponseRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .attach_response(&req, path.into_inner(), response_data.into_inner())
        .await
}

pub async fn update_response(
    req: HttpRequest,
    path: web::Path<i64>,
    response_data: web::Json<ReviewResponseRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .update_response(&req, path.into_inner(), response_data.into_inner())
        .await
}

pub async fn delete_response(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.delete_response(&req, path.into_inner()).await
}

pub async fn check_review(
    req: HttpRequest,
    query: web::Query<ReviewCheckParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.check_review(&req, query.into_inner()).await
}

pub async fn list_my_reviews(
    req: HttpRequest,
    query: web::Query<ReviewListParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .list_my_reviews(&req, query.into_inner())
        .await
}

pub async fn list_pending_reviews(
    req: HttpRequest,
    query: web::Query<ReviewListParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .list_pending_reviews(&req, query.into_inner())
        .await
}

pub async fn count_pending_reviews(req: HttpRequest) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.count_pending_reviews(&req).await
}

pub async fn list_received_reviews(
    req: HttpRequest,
    query: web::Query<ReviewListParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .list_received_reviews(&req, query.into_inner())
        .await
}

pub async fn list_recent_reviews(
    req: HttpRequest,
    query: web::Query<RecentReviewsParams>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .list_recent_reviews(&req, query.into_inner())
        .await
}

// 配置路由
pub fn configure_review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reviews")
            .wrap(middlewares::RequireJWT)
            .route(
                "",
                web::post()
                    .to(submit_review)
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .wrap(middlewares::RateLimit::review_submission()),
            )
            // 固定路径需在 /{id} 之前注册
            .route("/my", web::get().to(list_my_reviews))
            .route("/check", web::get().to(check_review))
            .route("/recent", web::get().to(list_recent_reviews))
            .route(
                "/received",
                web::get()
                    .to(list_received_reviews)
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
            )
            .route(
                "/pending",
                web::get()
                    .to(list_pending_reviews)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .route(
                "/pending/count",
                web::get()
                    .to(count_pending_reviews)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_review))
                    .route(web::put().to(update_review))
                    .route(web::delete().to(delete_review)),
            )
            .route(
                "/{id}/moderate",
                web::put()
                    .to(moderate_review)
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
            )
            .service(
                web::resource("/{id}/response")
                    .route(web::post().to(attach_response))
                    .route(web::put().to(update_response))
                    .route(web::delete().to(delete_response)),
            ),
    );
}
