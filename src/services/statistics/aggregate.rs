use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use std::sync::Arc;

use super::{StatisticsService, snapshot_for, visible_scope};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::offerings::entities::Offering;
use crate::models::reviews::entities::ModerationStatus;
use crate::models::statistics::{
    entities::RankedOffering,
    requests::{StatisticsScopeParams, TopOfferingsParams},
    responses::{
        DepartmentStatisticsResponse, DepartmentStatisticsView, OverviewResponse,
        RatingDistributionView, TopOfferingView, TopOfferingsResponse, round_mean,
    },
};
use crate::models::users::entities::Actor;
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

const MAX_TOP_LIMIT: usize = 50;

fn normalized_department(department: Option<&String>) -> Option<&str> {
    department.map(|d| d.trim()).filter(|d| !d.is_empty())
}

fn present_ranking(ranked: Vec<RankedOffering>, scope: &[Offering]) -> Vec<TopOfferingView> {
    let by_id: HashMap<i64, &Offering> = scope.iter().map(|o| (o.id, o)).collect();
    ranked
        .into_iter()
        .filter_map(|entry| {
            by_id.get(&entry.offering_id).map(|offering| TopOfferingView {
                offering: offering.brief(),
                mean_rating: round_mean(entry.mean_rating),
                total_reviews: entry.total_reviews,
            })
        })
        .collect()
}

pub(crate) async fn department_statistics(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: &StatisticsScopeParams,
) -> Result<DepartmentStatisticsResponse> {
    let scope = visible_scope(storage, actor, normalized_department(params.department.as_ref()))
        .await?;
    let snapshot = snapshot_for(storage, &scope).await?;

    Ok(DepartmentStatisticsResponse {
        items: snapshot
            .department_statistics(&scope)
            .iter()
            .map(DepartmentStatisticsView::from)
            .collect(),
    })
}

pub(crate) async fn rating_distribution(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: &StatisticsScopeParams,
) -> Result<RatingDistributionView> {
    let scope = visible_scope(storage, actor, normalized_department(params.department.as_ref()))
        .await?;
    let snapshot = snapshot_for(storage, &scope).await?;
    Ok(RatingDistributionView::from(&snapshot.rating_distribution(&scope)))
}

pub(crate) async fn top_offerings(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: &TopOfferingsParams,
    default_limit: usize,
) -> Result<TopOfferingsResponse> {
    let limit = params.limit.unwrap_or(default_limit).clamp(1, MAX_TOP_LIMIT);
    let scope = visible_scope(storage, actor, normalized_department(params.department.as_ref()))
        .await?;
    let snapshot = snapshot_for(storage, &scope).await?;

    Ok(TopOfferingsResponse {
        items: present_ranking(snapshot.top_offerings(&scope, limit), &scope),
    })
}

pub(crate) async fn overview(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: &StatisticsScopeParams,
    top_n: usize,
) -> Result<OverviewResponse> {
    let scope = visible_scope(storage, actor, normalized_department(params.department.as_ref()))
        .await?;
    let snapshot = snapshot_for(storage, &scope).await?;
    let overview = snapshot.overview(&scope, top_n);

    // 待审核数量只对管理员有意义
    let pending_reviews = if actor.is_admin() {
        Some(
            storage
                .count_reviews_by_status(ModerationStatus::Pending)
                .await?,
        )
    } else {
        None
    };

    Ok(OverviewResponse {
        offering_count: overview.offering_count,
        rated_offering_count: overview.rated_offering_count,
        total_reviews: overview.total_reviews,
        mean_rating: overview.mean_rating.map(round_mean),
        distribution: RatingDistributionView::from(&overview.distribution),
        top_offerings: present_ranking(overview.top_offerings, &scope),
        pending_reviews,
    })
}

pub async fn handle_department_statistics(
    service: &StatisticsService,
    request: &HttpRequest,
    params: StatisticsScopeParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => department_statistics(&storage, &actor, &params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            data,
            "Department statistics retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::GENERAL)),
    }
}

pub async fn handle_rating_distribution(
    service: &StatisticsService,
    request: &HttpRequest,
    params: StatisticsScopeParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => rating_distribution(&storage, &actor, &params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            data,
            "Rating distribution retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::GENERAL)),
    }
}

pub async fn handle_top_offerings(
    service: &StatisticsService,
    request: &HttpRequest,
    params: TopOfferingsParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let default_limit = AppConfig::get().review.top_offerings_limit;
    let result = match current_actor(request) {
        Ok(actor) => top_offerings(&storage, &actor, &params, default_limit).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            data,
            "Top offerings retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::GENERAL)),
    }
}

pub async fn handle_overview(
    service: &StatisticsService,
    request: &HttpRequest,
    params: StatisticsScopeParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let top_n = AppConfig::get().review.top_offerings_limit;
    let result = match current_actor(request) {
        Ok(actor) => overview(&storage, &actor, &params, top_n).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            data,
            "Statistics overview retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::GENERAL)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{User, UserRole};
    use crate::services::statistics::testing::approved_review;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_offering, seed_user};

    struct World {
        storage: Arc<dyn Storage>,
        admin: User,
        teacher: User,
        cs_student: User,
    }

    /// CS: A(5, 3, 4 → 4.0), B(2 → 2.0), C(无评分)；Math: D(5 → 5.0)
    async fn world() -> World {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let teacher = seed_user(&storage, "teacher", UserRole::Teacher, None).await;
        let cs_student = seed_user(&storage, "cs0", UserRole::Student, Some("CS")).await;
        let reviewers = [
            seed_user(&storage, "r1", UserRole::Student, Some("CS")).await,
            seed_user(&storage, "r2", UserRole::Student, Some("CS")).await,
            seed_user(&storage, "r3", UserRole::Student, Some("CS")).await,
            seed_user(&storage, "r4", UserRole::Student, Some("Math")).await,
        ];

        let a = seed_offering(&storage, "CSA", "CS", None).await;
        let b = seed_offering(&storage, "CSB", "CS", None).await;
        seed_offering(&storage, "CSC", "CS", None).await;
        let d = seed_offering(&storage, "MAD", "Math", None).await;

        approved_review(&storage, reviewers[0].id, a.id, 5, admin.id).await;
        approved_review(&storage, reviewers[1].id, a.id, 3, admin.id).await;
        approved_review(&storage, reviewers[2].id, a.id, 4, admin.id).await;
        approved_review(&storage, reviewers[0].id, b.id, 2, admin.id).await;
        approved_review(&storage, reviewers[3].id, d.id, 5, admin.id).await;

        World {
            storage,
            admin,
            teacher,
            cs_student,
        }
    }

    #[tokio::test]
    async fn test_department_mean_of_means() {
        let w = world().await;
        let result = department_statistics(
            &w.storage,
            &w.teacher.actor(),
            &StatisticsScopeParams::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.items.len(), 2);
        let cs = &result.items[0];
        assert_eq!(cs.department, "CS");
        assert_eq!(cs.offering_count, 3);
        assert_eq!(cs.rated_offering_count, 2);
        assert_eq!(cs.total_reviews, 4);
        // (4.0 + 2.0) / 2，而不是按评价加权的 3.5
        assert_eq!(cs.mean_rating, Some(3.0));
    }

    #[tokio::test]
    async fn test_student_statistics_stay_in_department() {
        let w = world().await;
        let result = department_statistics(
            &w.storage,
            &w.cs_student.actor(),
            &StatisticsScopeParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].department, "CS");

        let top = top_offerings(
            &w.storage,
            &w.cs_student.actor(),
            &TopOfferingsParams::default(),
            5,
        )
        .await
        .unwrap();
        let codes: Vec<_> = top.items.iter().map(|t| t.offering.code.as_str()).collect();
        assert_eq!(codes, vec!["CSA", "CSB"]);
    }

    #[tokio::test]
    async fn test_top_offerings_ranking_and_limit() {
        let w = world().await;
        let top = top_offerings(
            &w.storage,
            &w.teacher.actor(),
            &TopOfferingsParams {
                limit: Some(2),
                department: None,
            },
            5,
        )
        .await
        .unwrap();
        let codes: Vec<_> = top.items.iter().map(|t| t.offering.code.as_str()).collect();
        assert_eq!(codes, vec!["MAD", "CSA"]);
        assert_eq!(top.items[1].mean_rating, 4.0);
        assert_eq!(top.items[1].total_reviews, 3);
    }

    #[tokio::test]
    async fn test_distribution_counts_rated_offerings() {
        let w = world().await;
        let view = rating_distribution(
            &w.storage,
            &w.teacher.actor(),
            &StatisticsScopeParams {
                department: Some(" CS ".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(view.rated_offering_count, 2);
        assert_eq!(view.buckets[1].count, 1); // B → 2 星
        assert_eq!(view.buckets[3].count, 1); // A → 4 星
    }

    #[tokio::test]
    async fn test_overview_pending_only_for_admin() {
        let w = world().await;
        let admin_view = overview(
            &w.storage,
            &w.admin.actor(),
            &StatisticsScopeParams::default(),
            3,
        )
        .await
        .unwrap();
        assert_eq!(admin_view.offering_count, 4);
        assert_eq!(admin_view.rated_offering_count, 3);
        assert_eq!(admin_view.total_reviews, 5);
        // (4.0 + 2.0 + 5.0) / 3
        assert_eq!(admin_view.mean_rating, Some(3.67));
        assert_eq!(admin_view.top_offerings.len(), 3);
        assert_eq!(admin_view.pending_reviews, Some(0));

        let student_view = overview(
            &w.storage,
            &w.cs_student.actor(),
            &StatisticsScopeParams::default(),
            3,
        )
        .await
        .unwrap();
        assert_eq!(student_view.offering_count, 3);
        assert!(student_view.pending_reviews.is_none());
    }
}
