use super::entities::OfferingType;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct OfferingListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub department: Option<String>,
    pub offering_type: Option<OfferingType>,
    pub search: Option<String>,
    pub responsible_id: Option<i64>,
    /// 仅管理员生效
    #[serde(default)]
    pub include_inactive: bool,
}

// 列表查询条件（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct OfferingListQuery {
    pub department: Option<String>,
    pub offering_type: Option<OfferingType>,
    pub search: Option<String>,
    pub responsible_id: Option<i64>,
    pub include_inactive: bool,
}

impl From<&OfferingListParams> for OfferingListQuery {
    fn from(params: &OfferingListParams) -> Self {
        Self {
            department: params.department.clone(),
            offering_type: params.offering_type,
            search: params.search.clone(),
            responsible_id: params.responsible_id,
            include_inactive: params.include_inactive,
        }
    }
}

// 创建请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct CreateOfferingRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub offering_type: OfferingType,
    pub department: String,
    pub responsible_id: Option<i64>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
}

// 更新请求，缺省字段保持不变
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct UpdateOfferingRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub offering_type: Option<OfferingType>,
    pub department: Option<String>,
    /// 缺省保持不变，显式 null 取消负责人
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "number | null")]
    pub responsible_id: Option<Option<i64>>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
}
