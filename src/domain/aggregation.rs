//! 统计聚合
//!
//! 快照只收录已通过且未删除的评价。各函数的 `scope` 参数是调用方
//! 已经按可见性过滤过的对象集合，聚合本身不关心谁在读。

use std::collections::{BTreeMap, BTreeSet};

use crate::models::offerings::entities::Offering;
use crate::models::reviews::entities::Review;
use crate::models::reviews::rating::Rating;
use crate::models::statistics::entities::{
    DepartmentStatistics, OfferingStatistics, RankedOffering, RatingDistribution,
    StatisticsOverview,
};

#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: i64,
    count: i64,
}

impl MeanAccumulator {
    fn push(&mut self, rating: Option<Rating>) {
        if let Some(rating) = rating {
            self.sum += i64::from(rating.value());
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct OfferingAccumulator {
    reviews: i64,
    overall: MeanAccumulator,
    clarity: MeanAccumulator,
    material: MeanAccumulator,
    pedagogy: MeanAccumulator,
}

/// 聚合快照
#[derive(Debug, Clone, Default)]
pub struct AggregationSnapshot {
    offerings: BTreeMap<i64, OfferingAccumulator>,
}

impl AggregationSnapshot {
    pub fn from_reviews<'a, I>(reviews: I) -> Self
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let mut offerings: BTreeMap<i64, OfferingAccumulator> = BTreeMap::new();
        for review in reviews.into_iter().filter(|r| r.is_published()) {
            let acc = offerings.entry(review.offering_id).or_default();
            acc.reviews += 1;
            acc.overall.push(Some(review.ratings.overall));
            acc.clarity.push(review.ratings.clarity);
            acc.material.push(review.ratings.material);
            acc.pedagogy.push(review.ratings.pedagogy);
        }
        Self { offerings }
    }

    pub fn offering_statistics(&self, offering_id: i64) -> OfferingStatistics {
        match self.offerings.get(&offering_id) {
            Some(acc) => OfferingStatistics {
                offering_id,
                total_reviews: acc.reviews,
                mean_overall: acc.overall.mean(),
                mean_clarity: acc.clarity.mean(),
                mean_material: acc.material.mean(),
                mean_pedagogy: acc.pedagogy.mean(),
            },
            None => OfferingStatistics::empty(offering_id),
        }
    }

    /// 范围内有评分的对象，按 id 去重
    fn rated_in_scope(&self, scope: &[Offering]) -> Vec<OfferingStatistics> {
        scope
            .iter()
            .map(|o| o.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|id| self.offering_statistics(id))
            .filter(OfferingStatistics::is_rated)
            .collect()
    }

    /// 排行：均值降序，评价数降序，id 升序
    pub fn top_offerings(&self, scope: &[Offering], n: usize) -> Vec<RankedOffering> {
        let mut ranked: Vec<RankedOffering> = self
            .rated_in_scope(scope)
            .into_iter()
            .filter_map(|stats| {
                stats.mean_overall.map(|mean| RankedOffering {
                    offering_id: stats.offering_id,
                    mean_rating: mean,
                    total_reviews: stats.total_reviews,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.mean_rating
                .total_cmp(&a.mean_rating)
                .then(b.total_reviews.cmp(&a.total_reviews))
                .then(a.offering_id.cmp(&b.offering_id))
        });
        ranked.truncate(n);
        ranked
    }

    /// 每个有评分的对象按 floor(mean + 0.5) 落入 1..=5 的桶
    pub fn rating_distribution(&self, scope: &[Offering]) -> RatingDistribution {
        let mut distribution = RatingDistribution::default();
        for stats in self.rated_in_scope(scope) {
            if let Some(mean) = stats.mean_overall {
                distribution.counts[bucket_index(mean)] += 1;
            }
        }
        distribution
    }

    /// 按院系分组，院系均值 = 各有评分对象均值的平均
    pub fn department_statistics(&self, scope: &[Offering]) -> Vec<DepartmentStatistics> {
        let mut groups: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for offering in scope {
            groups
                .entry(offering.department.trim().to_string())
                .or_default()
                .insert(offering.id);
        }

        groups
            .into_iter()
            .map(|(department, ids)| {
                let stats: Vec<OfferingStatistics> =
                    ids.iter().map(|id| self.offering_statistics(*id)).collect();
                let means: Vec<f64> = stats.iter().filter_map(|s| s.mean_overall).collect();

                DepartmentStatistics {
                    department,
                    offering_count: ids.len() as i64,
                    rated_offering_count: means.len() as i64,
                    total_reviews: stats.iter().map(|s| s.total_reviews).sum(),
                    mean_rating: mean_of(&means),
                }
            })
            .collect()
    }

    pub fn overview(&self, scope: &[Offering], top_n: usize) -> StatisticsOverview {
        let unique: BTreeSet<i64> = scope.iter().map(|o| o.id).collect();
        let rated = self.rated_in_scope(scope);
        let means: Vec<f64> = rated.iter().filter_map(|s| s.mean_overall).collect();

        StatisticsOverview {
            offering_count: unique.len() as i64,
            rated_offering_count: rated.len() as i64,
            total_reviews: rated.iter().map(|s| s.total_reviews).sum(),
            mean_rating: mean_of(&means),
            distribution: self.rating_distribution(scope),
            top_offerings: self.top_offerings(scope, top_n),
        }
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn bucket_index(mean: f64) -> usize {
    let stars = (mean + 0.5).floor().clamp(1.0, 5.0) as usize;
    stars - 1
}
