use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::OfferingService;
use crate::cache::ObjectCache;
use crate::domain::visibility::can_view_offering;
use crate::errors::{FeedbackError, Result};
use crate::models::ApiResponse;
use crate::models::offerings::responses::{OfferingDetailResponse, ResponsibleInfo};
use crate::models::users::entities::Actor;
use crate::services::statistics::cached_offering_statistics;
use crate::services::{ErrorCodes, cache_from_request, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn get_offering(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    actor: &Actor,
    offering_id: i64,
) -> Result<OfferingDetailResponse> {
    let offering = storage
        .get_offering_by_id(offering_id)
        .await?
        .filter(|o| can_view_offering(actor, o))
        .ok_or_else(|| FeedbackError::not_found(format!("Offering {offering_id} not found")))?;

    let responsible = match offering.responsible_id {
        Some(id) => storage
            .get_user_by_id(id)
            .await?
            .map(|user| ResponsibleInfo {
                id: user.id,
                name: user.public_name().to_string(),
            }),
        None => None,
    };

    let statistics = cached_offering_statistics(storage, cache, &offering).await?;

    Ok(OfferingDetailResponse {
        offering,
        responsible,
        statistics,
    })
}

pub async fn handle_get_offering(
    service: &OfferingService,
    request: &HttpRequest,
    offering_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = cache_from_request(request);

    let result = match current_actor(request) {
        Ok(actor) => get_offering(&storage, cache.as_ref(), &actor, offering_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Offering retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}
