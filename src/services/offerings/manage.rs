//! 管理员维护课程/服务目录

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::{OfferingService, ensure_responsible_teacher};
use crate::errors::{FeedbackError, Result};
use crate::models::offerings::entities::Offering;
use crate::models::offerings::requests::{CreateOfferingRequest, UpdateOfferingRequest};
use crate::models::users::entities::Actor;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;
use crate::utils::validate::{validate_department, validate_offering_code};

/// 创建结果，代码冲突单独报告
#[derive(Debug)]
pub(crate) enum CreateOutcome {
    Created(Offering),
    CodeTaken(String),
}

fn require_admin(actor: &Actor) -> Result<()> {
    if actor.active && actor.is_admin() {
        Ok(())
    } else {
        Err(FeedbackError::forbidden(
            "Only administrators can manage offerings",
        ))
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 128 {
        return Err(FeedbackError::validation(
            "Offering name must be between 1 and 128 characters",
        ));
    }
    Ok(name.to_string())
}

pub(crate) async fn create_offering(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    mut request: CreateOfferingRequest,
) -> Result<CreateOutcome> {
    require_admin(actor)?;

    request.code = request.code.trim().to_string();
    validate_offering_code(&request.code).map_err(FeedbackError::validation)?;
    request.name = validate_name(&request.name)?;
    request.department = validate_department(&request.department).map_err(FeedbackError::validation)?;
    ensure_responsible_teacher(storage, request.responsible_id).await?;

    if storage.get_offering_by_code(&request.code).await?.is_some() {
        return Ok(CreateOutcome::CodeTaken(request.code));
    }

    // 并发创建时由唯一索引兜底
    let code = request.code.clone();
    let Some(offering) = storage.create_offering(request).await? else {
        return Ok(CreateOutcome::CodeTaken(code));
    };
    info!("Offering {} created by admin {}", offering.code, actor.id);
    Ok(CreateOutcome::Created(offering))
}

pub(crate) async fn update_offering(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    offering_id: i64,
    mut request: UpdateOfferingRequest,
) -> Result<Offering> {
    require_admin(actor)?;

    if let Some(name) = request.name.as_deref() {
        request.name = Some(validate_name(name)?);
    }
    if let Some(department) = request.department.as_deref() {
        request.department =
            Some(validate_department(department).map_err(FeedbackError::validation)?);
    }
    ensure_responsible_teacher(storage, request.responsible_id.flatten()).await?;

    let offering = storage
        .update_offering(offering_id, request)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Offering {offering_id} not found")))?;
    info!("Offering {} updated by admin {}", offering.code, actor.id);
    Ok(offering)
}

pub(crate) async fn set_active(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    offering_id: i64,
    active: bool,
) -> Result<Offering> {
    require_admin(actor)?;

    let offering = storage
        .set_offering_active(offering_id, active)
        .await?
        .ok_or_else(|| FeedbackError::not_found(format!("Offering {offering_id} not found")))?;
    info!(
        "Offering {} {} by admin {}",
        offering.code,
        if active { "activated" } else { "deactivated" },
        actor.id
    );
    Ok(offering)
}

pub async fn handle_create_offering(
    service: &OfferingService,
    request: &HttpRequest,
    create_request: CreateOfferingRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => create_offering(&storage, &actor, create_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(CreateOutcome::Created(offering)) => Ok(HttpResponse::Created().json(
            ApiResponse::success(offering, "Offering created successfully"),
        )),
        Ok(CreateOutcome::CodeTaken(code)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::OfferingCodeAlreadyExists,
                format!("Offering code {code} already exists"),
            ),
        )),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}

pub async fn handle_update_offering(
    service: &OfferingService,
    request: &HttpRequest,
    offering_id: i64,
    update_request: UpdateOfferingRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => update_offering(&storage, &actor, offering_id, update_request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(offering) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            offering,
            "Offering updated successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}

pub async fn handle_set_active(
    service: &OfferingService,
    request: &HttpRequest,
    offering_id: i64,
    active: bool,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => set_active(&storage, &actor, offering_id, active).await,
        Err(e) => Err(e),
    };

    let message = if active {
        "Offering activated successfully"
    } else {
        "Offering deactivated successfully"
    };
    match result {
        Ok(offering) => Ok(HttpResponse::Ok().json(ApiResponse::success(offering, message))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}
