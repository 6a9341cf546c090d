use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::statistics::requests::{StatisticsScopeParams, TopOfferingsParams};
use crate::services::StatisticsService;

// 懒加载的全局 STATISTICS_SERVICE 实例
static STATISTICS_SERVICE: Lazy<StatisticsService> = Lazy::new(StatisticsService::new_lazy);

// HTTP处理程序
pub async fn get_offering_statistics(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    STATISTICS_SERVICE
        .get_offering_statistics(&req, path.into_inner())
        .await
}

pub async fn get_department_statistics(
    req: HttpRequest,
    query: web::Query<StatisticsScopeParams>,
) -> ActixResult<HttpResponse> {
    STATISTICS_SERVICE
        .get_department_statistics(&req, query.into_inner())
        .await
}

pub async fn get_rating_distribution(
    req: HttpRequest,
    query: web::Query<StatisticsScopeParams>,
) -> ActixResult<HttpResponse> {
    STATISTICS_SERVICE
        .get_rating_distribution(&req, query.into_inner())
        .await
}

pub async fn get_top_offerings(
    req: HttpRequest,
    query: web::Query<TopOfferingsParams>,
) -> ActixResult<HttpResponse> {
    STATISTICS_SERVICE
        .get_top_offerings(&req, query.into_inner())
        .await
}

pub async fn get_overview(
    req: HttpRequest,
    query: web::Query<StatisticsScopeParams>,
) -> ActixResult<HttpResponse> {
    STATISTICS_SERVICE
        .get_overview(&req, query.into_inner())
        .await
}

// 配置路由
pub fn configure_statistics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/statistics")
            .wrap(middlewares::RequireJWT)
            .wrap(middlewares::RateLimit::api())
            .route("/offerings/{id}", web::get().to(get_offering_statistics))
            .route("/departments", web::get().to(get_department_statistics))
            .route("/distribution", web::get().to(get_rating_distribution))
            .route("/top", web::get().to(get_top_offerings))
            .route("/overview", web::get().to(get_overview)),
    );
}
