use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::entities::{DepartmentStatistics, OfferingStatistics, RatingDistribution};
use crate::models::offerings::entities::OfferingBrief;

/// 均值统一保留两位小数
pub fn round_mean(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_opt(value: Option<f64>) -> Option<f64> {
    value.map(round_mean)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct OfferingStatisticsView {
    pub offering_id: i64,
    pub total_reviews: i64,
    pub mean_overall: Option<f64>,
    pub mean_clarity: Option<f64>,
    pub mean_material: Option<f64>,
    pub mean_pedagogy: Option<f64>,
}

impl From<&OfferingStatistics> for OfferingStatisticsView {
    fn from(stats: &OfferingStatistics) -> Self {
        Self {
            offering_id: stats.offering_id,
            total_reviews: stats.total_reviews,
            mean_overall: round_opt(stats.mean_overall),
            mean_clarity: round_opt(stats.mean_clarity),
            mean_material: round_opt(stats.mean_material),
            mean_pedagogy: round_opt(stats.mean_pedagogy),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct DepartmentStatisticsView {
    pub department: String,
    pub offering_count: i64,
    pub rated_offering_count: i64,
    pub total_reviews: i64,
    pub mean_rating: Option<f64>,
}

impl From<&DepartmentStatistics> for DepartmentStatisticsView {
    fn from(stats: &DepartmentStatistics) -> Self {
        Self {
            department: stats.department.clone(),
            offering_count: stats.offering_count,
            rated_offering_count: stats.rated_offering_count,
            total_reviews: stats.total_reviews,
            mean_rating: round_opt(stats.mean_rating),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct DepartmentStatisticsResponse {
    pub items: Vec<DepartmentStatisticsView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct DistributionBucket {
    pub rating: u8,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct RatingDistributionView {
    pub buckets: Vec<DistributionBucket>,
    pub rated_offering_count: i64,
}

impl From<&RatingDistribution> for RatingDistributionView {
    fn from(distribution: &RatingDistribution) -> Self {
        Self {
            buckets: (1..=5)
                .map(|rating| DistributionBucket {
                    rating,
                    count: distribution.count(rating),
                })
                .collect(),
            rated_offering_count: distribution.total(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct TopOfferingView {
    pub offering: OfferingBrief,
    pub mean_rating: f64,
    pub total_reviews: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct TopOfferingsResponse {
    pub items: Vec<TopOfferingView>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "statistics.ts")]
pub struct OverviewResponse {
    pub offering_count: i64,
    pub rated_offering_count: i64,
    pub total_reviews: i64,
    pub mean_rating: Option<f64>,
    pub distribution: RatingDistributionView,
    pub top_offerings: Vec<TopOfferingView>,
    /// 仅管理员可见
    pub pending_reviews: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_mean_two_decimals() {
        assert_eq!(round_mean(4.0 / 3.0), 1.33);
        assert_eq!(round_mean(3.5), 3.5);
        assert_eq!(round_mean(2.0 / 3.0), 0.67);
    }

    #[test]
    fn test_view_keeps_undefined_means() {
        let stats = OfferingStatistics {
            mean_overall: Some(11.0 / 3.0),
            total_reviews: 3,
            ..OfferingStatistics::empty(7)
        };
        let view = OfferingStatisticsView::from(&stats);
        assert_eq!(view.mean_overall, Some(3.67));
        assert_eq!(view.mean_clarity, None);
        assert_eq!(view.total_reviews, 3);
    }

    #[test]
    fn test_distribution_view_lists_all_buckets() {
        let distribution = RatingDistribution {
            counts: [0, 1, 0, 2, 0],
        };
        let view = RatingDistributionView::from(&distribution);
        assert_eq!(view.buckets.len(), 5);
        assert_eq!(view.buckets[3], DistributionBucket { rating: 4, count: 2 });
        assert_eq!(view.rated_offering_count, 3);
    }
}
