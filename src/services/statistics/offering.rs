use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::{StatisticsService, cached_offering_statistics};
use crate::cache::ObjectCache;
use crate::domain::visibility::can_view_offering;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::statistics::{
    entities::OfferingStatistics, responses::OfferingStatisticsView,
};
use crate::models::users::entities::Actor;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

/// 不可见的对象与不存在的对象都返回空统计，且不写入缓存
pub(crate) async fn offering_statistics(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    offering_id: i64,
) -> Result<OfferingStatisticsView> {
    let offering = storage
        .get_offering_by_id(offering_id)
        .await?
        .filter(|o| can_view_offering(actor, o));

    match offering {
        Some(offering) => cached_offering_statistics(storage, cache, &offering).await,
        None => Ok(OfferingStatisticsView::from(&OfferingStatistics::empty(
            offering_id,
        ))),
    }
}

pub async fn handle_offering_statistics(
    service: &StatisticsService,
    request: &HttpRequest,
    offering_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => offering_statistics(&storage, cache.as_ref(), &actor, offering_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Statistics retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}
