use super::entities::Offering;
use crate::models::statistics::responses::OfferingStatisticsView;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 列表项：对象本身加上统计摘要
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct OfferingWithStats {
    #[serde(flatten)]
    #[ts(flatten)]
    pub offering: Offering,
    pub statistics: OfferingStatisticsView,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct OfferingListResponse {
    pub items: Vec<OfferingWithStats>,
    pub pagination: PaginationInfo,
}

// 负责人信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct ResponsibleInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct OfferingDetailResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub offering: Offering,
    pub responsible: Option<ResponsibleInfo>,
    pub statistics: OfferingStatisticsView,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct DepartmentListResponse {
    pub departments: Vec<String>,
}
