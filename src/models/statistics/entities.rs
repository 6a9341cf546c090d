//! 统计结果（未取整）
//!
//! 这里的均值保持 `f64` 原值，只在响应层统一保留两位小数。
//! `None` 表示没有可用数据，不等于 0。

/// 单个对象的统计
#[derive(Debug, Clone, PartialEq)]
pub struct OfferingStatistics {
    pub offering_id: i64,
    pub total_reviews: i64,
    pub mean_overall: Option<f64>,
    pub mean_clarity: Option<f64>,
    pub mean_material: Option<f64>,
    pub mean_pedagogy: Option<f64>,
}

impl OfferingStatistics {
    pub fn empty(offering_id: i64) -> Self {
        Self {
            offering_id,
            total_reviews: 0,
            mean_overall: None,
            mean_clarity: None,
            mean_material: None,
            mean_pedagogy: None,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.mean_overall.is_some()
    }
}

/// 院系统计，均值为各对象均值的平均（不按评价数加权）
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentStatistics {
    pub department: String,
    pub offering_count: i64,
    pub rated_offering_count: i64,
    pub total_reviews: i64,
    pub mean_rating: Option<f64>,
}

/// 评分分布，下标 0 对应 1 星
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingDistribution {
    pub counts: [i64; 5],
}

impl RatingDistribution {
    pub fn count(&self, stars: u8) -> i64 {
        match stars {
            1..=5 => self.counts[usize::from(stars) - 1],
            _ => 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }
}

/// 排行榜条目
#[derive(Debug, Clone, PartialEq)]
pub struct RankedOffering {
    pub offering_id: i64,
    pub mean_rating: f64,
    pub total_reviews: i64,
}

/// 仪表盘总览
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsOverview {
    pub offering_count: i64,
    pub rated_offering_count: i64,
    pub total_reviews: i64,
    pub mean_rating: Option<f64>,
    pub distribution: RatingDistribution,
    pub top_offerings: Vec<RankedOffering>,
}
