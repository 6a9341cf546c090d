//! 统计服务
//!
//! 所有统计都先按参与者的可见范围取出对象，再交给聚合引擎计算。
//! 单个对象的统计会写入对象缓存，评价发生变化时由评价服务失效。

pub mod aggregate;
pub mod offering;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::domain::aggregation::AggregationSnapshot;
use crate::domain::visibility::visible_offerings;
use crate::errors::Result;
use crate::models::offerings::{entities::Offering, requests::OfferingListQuery};
use crate::models::reviews::requests::ReviewQuery;
use crate::models::statistics::{
    requests::{StatisticsScopeParams, TopOfferingsParams},
    responses::OfferingStatisticsView,
};
use crate::models::users::entities::Actor;
use crate::storage::Storage;

pub struct StatisticsService {
    storage: Option<Arc<dyn Storage>>,
}

impl StatisticsService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    // 单个对象的统计
    pub async fn get_offering_statistics(
        &self,
        request: &HttpRequest,
        offering_id: i64,
    ) -> ActixResult<HttpResponse> {
        offering::handle_offering_statistics(self, request, offering_id).await
    }

    // 按院系统计
    pub async fn get_department_statistics(
        &self,
        request: &HttpRequest,
        params: StatisticsScopeParams,
    ) -> ActixResult<HttpResponse> {
        aggregate::handle_department_statistics(self, request, params).await
    }

    // 评分分布
    pub async fn get_rating_distribution(
        &self,
        request: &HttpRequest,
        params: StatisticsScopeParams,
    ) -> ActixResult<HttpResponse> {
        aggregate::handle_rating_distribution(self, request, params).await
    }

    // 排行榜
    pub async fn get_top_offerings(
        &self,
        request: &HttpRequest,
        params: TopOfferingsParams,
    ) -> ActixResult<HttpResponse> {
        aggregate::handle_top_offerings(self, request, params).await
    }

    // 总览
    pub async fn get_overview(
        &self,
        request: &HttpRequest,
        params: StatisticsScopeParams,
    ) -> ActixResult<HttpResponse> {
        aggregate::handle_overview(self, request, params).await
    }
}

/// 参与者可见的对象，可按院系收窄
pub(crate) async fn visible_scope(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    department: Option<&str>,
) -> Result<Vec<Offering>> {
    let offerings = storage
        .list_offerings(OfferingListQuery {
            department: department.map(str::to_string),
            include_inactive: actor.is_admin(),
            ..Default::default()
        })
        .await?;
    Ok(visible_offerings(actor, offerings))
}

/// 一次查询取出范围内全部已通过评价
pub(crate) async fn snapshot_for(
    storage: &Arc<dyn Storage>,
    offerings: &[Offering],
) -> Result<AggregationSnapshot> {
    let ids: Vec<i64> = offerings.iter().map(|o| o.id).collect();
    let reviews = storage.list_reviews(ReviewQuery::approved_for(ids)).await?;
    Ok(AggregationSnapshot::from_reviews(&reviews))
}

pub(crate) fn stats_cache_key(offering_id: i64) -> String {
    format!("stats:offering:{offering_id}")
}

pub(crate) async fn invalidate_offering_statistics(
    cache: Option<&Arc<dyn ObjectCache>>,
    offering_id: i64,
) {
    if let Some(cache) = cache {
        cache.remove(&stats_cache_key(offering_id)).await;
    }
}

/// 单个对象的统计，优先读缓存
///
/// 调用方负责可见性检查。
pub(crate) async fn cached_offering_statistics(
    storage: &Arc<dyn Storage>,
    cache: Option<&Arc<dyn ObjectCache>>,
    offering: &Offering,
) -> Result<OfferingStatisticsView> {
    let key = stats_cache_key(offering.id);

    if let Some(cache) = cache
        && let CacheResult::Found(view) = cache.get_json::<OfferingStatisticsView>(&key).await
    {
        debug!("Statistics cache hit for offering {}", offering.id);
        return Ok(view);
    }

    let snapshot = snapshot_for(storage, std::slice::from_ref(offering)).await?;
    let view = OfferingStatisticsView::from(&snapshot.offering_statistics(offering.id));

    if let Some(cache) = cache {
        cache
            .insert_json(key, &view, AppConfig::get().cache.default_ttl)
            .await;
    }

    Ok(view)
}

#[cfg(test)]
pub(crate) mod testing {
    //! 统计与评价服务测试共用的数据准备

    use std::sync::Arc;

    use crate::domain::ReviewPolicy;
    use crate::models::reviews::entities::{ModerationStatus, NewReview, ReviewInsertOutcome};
    use crate::models::reviews::rating::RatingSet;
    use crate::storage::Storage;

    /// 直接写入一条已通过的评价
    pub async fn approved_review(
        storage: &Arc<dyn Storage>,
        reviewer_id: i64,
        offering_id: i64,
        overall: i64,
        admin_id: i64,
    ) -> i64 {
        let outcome = storage
            .insert_review(
                reviewer_id,
                NewReview {
                    offering_id,
                    ratings: RatingSet::from_raw(overall, None, None, None).unwrap(),
                    comment: "Seeded review comment".to_string(),
                    anonymous: true,
                },
                &ReviewPolicy::default(),
            )
            .await
            .unwrap();
        let ReviewInsertOutcome::Inserted(review) = outcome else {
            panic!("seeded review collided");
        };
        storage
            .transition_review_status(
                review.id,
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                admin_id,
            )
            .await
            .unwrap()
            .unwrap();
        review.id
    }
}
