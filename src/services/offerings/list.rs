use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::OfferingService;
use crate::domain::visibility::visible_offerings;
use crate::errors::Result;
use crate::models::offerings::{
    requests::{OfferingListParams, OfferingListQuery},
    responses::{DepartmentListResponse, OfferingListResponse, OfferingWithStats},
};
use crate::models::statistics::responses::OfferingStatisticsView;
use crate::models::users::entities::Actor;
use crate::models::{ApiResponse, PaginatedResponse};
use crate::services::statistics::{snapshot_for, visible_scope};
use crate::services::{ErrorCodes, current_actor, error_response};
use crate::storage::Storage;

pub(crate) async fn list_offerings(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
    params: &OfferingListParams,
) -> Result<OfferingListResponse> {
    let mut query = OfferingListQuery::from(params);
    // 只有管理员能看到已停用的对象
    query.include_inactive = query.include_inactive && actor.is_admin();

    let offerings = visible_offerings(actor, storage.list_offerings(query).await?);
    let page = PaginatedResponse::from_vec(offerings, &params.pagination);

    // 当前页的统计来自同一个快照
    let snapshot = snapshot_for(storage, &page.items).await?;
    let items = page
        .items
        .into_iter()
        .map(|offering| {
            let statistics =
                OfferingStatisticsView::from(&snapshot.offering_statistics(offering.id));
            OfferingWithStats {
                offering,
                statistics,
            }
        })
        .collect();

    Ok(OfferingListResponse {
        items,
        pagination: page.pagination,
    })
}

pub(crate) async fn list_departments(
    storage: &Arc<dyn Storage>,
    actor: &Actor,
) -> Result<DepartmentListResponse> {
    let departments: BTreeSet<String> = visible_scope(storage, actor, None)
        .await?
        .into_iter()
        .map(|o| o.department.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    Ok(DepartmentListResponse {
        departments: departments.into_iter().collect(),
    })
}

pub async fn handle_list_offerings(
    service: &OfferingService,
    request: &HttpRequest,
    params: OfferingListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => list_offerings(&storage, &actor, &params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Offerings retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}

pub async fn handle_list_departments(
    service: &OfferingService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let result = match current_actor(request) {
        Ok(actor) => list_departments(&storage, &actor).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Departments retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, ErrorCodes::OFFERING)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaginationQuery;
    use crate::models::users::entities::UserRole;
    use crate::services::statistics::testing::approved_review;
    use crate::storage::sea_orm_storage::testing::{memory_storage, seed_offering, seed_user};

    fn params(page: i64, size: i64) -> OfferingListParams {
        OfferingListParams {
            pagination: PaginationQuery { page, size },
            department: None,
            offering_type: None,
            search: None,
            responsible_id: None,
            include_inactive: false,
        }
    }

    #[tokio::test]
    async fn test_student_lists_only_department_offerings() {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("CS")).await;
        let cs1 = seed_offering(&storage, "CS101", "CS", None).await;
        seed_offering(&storage, "CS102", "CS", None).await;
        seed_offering(&storage, "MA101", "Math", None).await;
        approved_review(&storage, student.id, cs1.id, 4, admin.id).await;

        let result = list_offerings(&storage, &student.actor(), &params(1, 10))
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 2);
        let codes: Vec<_> = result.items.iter().map(|i| i.offering.code.as_str()).collect();
        assert_eq!(codes, vec!["CS101", "CS102"]);
        assert_eq!(result.items[0].statistics.mean_overall, Some(4.0));
        assert_eq!(result.items[1].statistics.total_reviews, 0);
        assert!(result.items[1].statistics.mean_overall.is_none());
    }

    #[tokio::test]
    async fn test_inactive_offerings_need_admin() {
        let storage = memory_storage().await;
        let admin = seed_user(&storage, "admin", UserRole::Admin, None).await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        let closed = seed_offering(&storage, "CS101", "CS", None).await;
        seed_offering(&storage, "CS102", "CS", None).await;
        storage.set_offering_active(closed.id, false).await.unwrap();

        let mut p = params(1, 10);
        p.include_inactive = true;

        let teacher_view = list_offerings(&storage, &teacher.actor(), &p).await.unwrap();
        assert_eq!(teacher_view.pagination.total, 1);

        let admin_view = list_offerings(&storage, &admin.actor(), &p).await.unwrap();
        assert_eq!(admin_view.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_pagination_after_filtering() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        for code in ["AA01", "AA02", "AA03"] {
            seed_offering(&storage, code, "CS", None).await;
        }

        let page = list_offerings(&storage, &teacher.actor(), &params(2, 2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].offering.code, "AA03");
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_departments_are_sorted_and_scoped() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t1", UserRole::Teacher, None).await;
        let student = seed_user(&storage, "s1", UserRole::Student, Some("Math")).await;
        seed_offering(&storage, "MA101", "Math", None).await;
        seed_offering(&storage, "CS101", "CS", None).await;
        seed_offering(&storage, "CS102", "CS", None).await;

        let all = list_departments(&storage, &teacher.actor()).await.unwrap();
        assert_eq!(all.departments, vec!["CS".to_string(), "Math".to_string()]);

        let own = list_departments(&storage, &student.actor()).await.unwrap();
        assert_eq!(own.departments, vec!["Math".to_string()]);
    }
}
