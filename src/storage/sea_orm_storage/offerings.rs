use super::SeaOrmStorage;
use crate::entity::offerings::{ActiveModel, Column, Entity as Offerings};
use crate::errors::{FeedbackError, Result};
use crate::models::offerings::{
    entities::Offering,
    requests::{CreateOfferingRequest, OfferingListQuery, UpdateOfferingRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

impl SeaOrmStorage {
    /// 创建课程/服务，代码被唯一索引拒绝时返回 None
    pub async fn create_offering_impl(
        &self,
        req: CreateOfferingRequest,
    ) -> Result<Option<Offering>> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            code: Set(req.code.trim().to_string()),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            offering_type: Set(req.offering_type.to_string()),
            department: Set(req.department.trim().to_string()),
            responsible_id: Set(req.responsible_id),
            credits: Set(req.credits),
            semester: Set(req.semester),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(Some(created.into_offering())),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(None),
            Err(e) => Err(FeedbackError::database_operation(format!(
                "创建课程失败: {e}"
            ))),
        }
    }

    /// 通过 ID 获取课程/服务
    pub async fn get_offering_by_id_impl(&self, id: i64) -> Result<Option<Offering>> {
        let result = Offerings::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_offering()))
    }

    /// 通过代码获取课程/服务
    pub async fn get_offering_by_code_impl(&self, code: &str) -> Result<Option<Offering>> {
        let result = Offerings::find()
            .filter(Column::Code.eq(code.trim()))
            .one(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_offering()))
    }

    pub async fn get_offerings_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Offering>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Offerings::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("批量查询课程失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_offering()).collect())
    }

    /// 按条件列出课程/服务，按代码排序
    ///
    /// 分页在服务层完成，因为可见性过滤只能在取出后进行。
    pub async fn list_offerings_impl(&self, query: OfferingListQuery) -> Result<Vec<Offering>> {
        let mut select = Offerings::find();

        if let Some(ref department) = query.department
            && !department.trim().is_empty()
        {
            select = select.filter(Column::Department.eq(department.trim()));
        }

        if let Some(offering_type) = query.offering_type {
            select = select.filter(Column::OfferingType.eq(offering_type.to_string()));
        }

        if let Some(responsible_id) = query.responsible_id {
            select = select.filter(Column::ResponsibleId.eq(responsible_id));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let keyword = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Code.contains(keyword))
                    .add(Column::Name.contains(keyword))
                    .add(Column::Description.contains(keyword)),
            );
        }

        if !query.include_inactive {
            select = select.filter(Column::IsActive.eq(true));
        }

        let result = select
            .order_by_asc(Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_offering()).collect())
    }

    /// 更新课程/服务信息
    pub async fn update_offering_impl(
        &self,
        id: i64,
        update: UpdateOfferingRequest,
    ) -> Result<Option<Offering>> {
        // 先检查是否存在
        if self.get_offering_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        if let Some(offering_type) = update.offering_type {
            model.offering_type = Set(offering_type.to_string());
        }

        if let Some(department) = update.department {
            model.department = Set(department.trim().to_string());
        }

        // Some(None) 表示取消负责人
        if let Some(responsible_id) = update.responsible_id {
            model.responsible_id = Set(responsible_id);
        }

        if let Some(credits) = update.credits {
            model.credits = Set(Some(credits));
        }

        if let Some(semester) = update.semester {
            model.semester = Set(Some(semester));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_offering_by_id_impl(id).await
    }

    /// 启用/停用课程/服务，历史评价保留
    pub async fn set_offering_active_impl(&self, id: i64, active: bool) -> Result<Option<Offering>> {
        let now = chrono::Utc::now().timestamp();

        let result = Offerings::update_many()
            .col_expr(Column::IsActive, sea_orm::sea_query::Expr::value(active))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| FeedbackError::database_operation(format!("更新课程状态失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_offering_by_id_impl(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{memory_storage, seed_offering, seed_user};
    use crate::models::offerings::entities::OfferingType;
    use crate::models::offerings::requests::{
        CreateOfferingRequest, OfferingListQuery, UpdateOfferingRequest,
    };
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_create_and_get_offering() {
        let storage = memory_storage().await;
        let created = seed_offering(&storage, "CS101", "Informatics", None).await;

        assert!(created.is_active);
        let by_code = storage.get_offering_by_code(" CS101 ").await.unwrap();
        assert_eq!(by_code.map(|o| o.id), Some(created.id));
        assert!(storage.get_offering_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t", UserRole::Teacher, None).await;
        seed_offering(&storage, "PHY200", "Physics", None).await;
        seed_offering(&storage, "CS201", "Informatics", Some(teacher.id)).await;
        seed_offering(&storage, "CS101", "Informatics", None).await;

        let all = storage
            .list_offerings(OfferingListQuery::default())
            .await
            .unwrap();
        let codes: Vec<_> = all.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec!["CS101", "CS201", "PHY200"]);

        let informatics = storage
            .list_offerings(OfferingListQuery {
                department: Some(" Informatics ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(informatics.len(), 2);

        let owned = storage
            .list_offerings(OfferingListQuery {
                responsible_id: Some(teacher.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].code, "CS201");

        let searched = storage
            .list_offerings(OfferingListQuery {
                search: Some("PHY".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_default_listing() {
        let storage = memory_storage().await;
        let offering = seed_offering(&storage, "LIB", "Services", None).await;

        let updated = storage
            .set_offering_active(offering.id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);

        assert!(storage
            .list_offerings(OfferingListQuery::default())
            .await
            .unwrap()
            .is_empty());

        let with_inactive = storage
            .list_offerings(OfferingListQuery {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(with_inactive.len(), 1);

        assert!(storage.set_offering_active(999, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_offering_keeps_missing_fields() {
        let storage = memory_storage().await;
        let offering = seed_offering(&storage, "CS101", "Informatics", None).await;

        let updated = storage
            .update_offering(
                offering.id,
                UpdateOfferingRequest {
                    name: Some("Intro to CS".to_string()),
                    offering_type: Some(OfferingType::Service),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Intro to CS");
        assert_eq!(updated.offering_type, OfferingType::Service);
        assert_eq!(updated.department, "Informatics");
        assert_eq!(updated.credits, Some(3));

        assert!(storage
            .update_offering(999, UpdateOfferingRequest::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unique_code_violation_is_reported_as_none() {
        let storage = memory_storage().await;
        seed_offering(&storage, "CS101", "Informatics", None).await;

        let clash = storage
            .create_offering(CreateOfferingRequest {
                code: "CS101".to_string(),
                name: "Another".to_string(),
                description: None,
                offering_type: OfferingType::Course,
                department: "Informatics".to_string(),
                responsible_id: None,
                credits: None,
                semester: None,
            })
            .await
            .unwrap();
        assert!(clash.is_none());
    }

    #[tokio::test]
    async fn test_update_can_clear_responsible_party() {
        let storage = memory_storage().await;
        let teacher = seed_user(&storage, "t", UserRole::Teacher, None).await;
        let offering = seed_offering(&storage, "CS101", "Informatics", Some(teacher.id)).await;

        let untouched = storage
            .update_offering(offering.id, UpdateOfferingRequest::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.responsible_id, Some(teacher.id));

        let cleared = storage
            .update_offering(
                offering.id,
                UpdateOfferingRequest {
                    responsible_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.responsible_id, None);
    }
}
