//! 课程/服务实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "offerings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub offering_type: String,
    pub department: String,
    pub responsible_id: Option<i64>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ResponsibleId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Responsible,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responsible.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_offering(self) -> crate::models::offerings::entities::Offering {
        use crate::models::offerings::entities::{Offering, OfferingType};
        use chrono::{DateTime, Utc};

        Offering {
            id: self.id,
            code: self.code,
            name: self.name,
            description: self.description,
            offering_type: self
                .offering_type
                .parse::<OfferingType>()
                .unwrap_or(OfferingType::Course),
            department: self.department,
            responsible_id: self.responsible_id,
            credits: self.credits,
            semester: self.semester,
            is_active: self.is_active,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
