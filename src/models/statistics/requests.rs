use serde::Deserialize;
use ts_rs::TS;

// 统计范围参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct StatisticsScopeParams {
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct TopOfferingsParams {
    pub limit: Option<usize>,
    pub department: Option<String>,
}
