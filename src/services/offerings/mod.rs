pub mod get;
pub mod list;
pub mod manage;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{FeedbackError, Result};
use crate::models::offerings::requests::{
    CreateOfferingRequest, OfferingListParams, UpdateOfferingRequest,
};
use crate::models::users::entities::UserRole;
use crate::storage::Storage;

pub struct OfferingService {
    storage: Option<Arc<dyn Storage>>,
}

impl OfferingService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    // 列出可见的课程/服务
    pub async fn list_offerings(
        &self,
        request: &HttpRequest,
        params: OfferingListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_offerings(self, request, params).await
    }

    // 可见对象涉及的院系
    pub async fn list_departments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_departments(self, request).await
    }

    // 详情（含负责人与统计）
    pub async fn get_offering(
        &self,
        request: &HttpRequest,
        offering_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::handle_get_offering(self, request, offering_id).await
    }

    pub async fn create_offering(
        &self,
        request: &HttpRequest,
        create_request: CreateOfferingRequest,
    ) -> ActixResult<HttpResponse> {
        manage::handle_create_offering(self, request, create_request).await
    }

    pub async fn update_offering(
        &self,
        request: &HttpRequest,
        offering_id: i64,
        update_request: UpdateOfferingRequest,
    ) -> ActixResult<HttpResponse> {
        manage::handle_update_offering(self, request, offering_id, update_request).await
    }

    // 停用（软删除），已有评价保留
    pub async fn deactivate_offering(
        &self,
        request: &HttpRequest,
        offering_id: i64,
    ) -> ActixResult<HttpResponse> {
        manage::handle_set_active(self, request, offering_id, false).await
    }

    pub async fn activate_offering(
        &self,
        request: &HttpRequest,
        offering_id: i64,
    ) -> ActixResult<HttpResponse> {
        manage::handle_set_active(self, request, offering_id, true).await
    }
}

/// 负责人必须是教师账号
pub(crate) async fn ensure_responsible_teacher(
    storage: &Arc<dyn Storage>,
    responsible_id: Option<i64>,
) -> Result<()> {
    let Some(id) = responsible_id else {
        return Ok(());
    };
    match storage.get_user_by_id(id).await? {
        Some(user) if user.role == UserRole::Teacher => Ok(()),
        Some(_) => Err(FeedbackError::validation(
            "Responsible party must be a teacher",
        )),
        None => Err(FeedbackError::validation(format!(
            "Responsible user {id} does not exist"
        ))),
    }
}
