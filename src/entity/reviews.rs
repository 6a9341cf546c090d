//! 评价实体
//!
//! 回复内联在评价行上，`response_text` 为空表示尚未回复。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub offering_id: i64,
    pub reviewer_id: i64,
    pub rating_overall: i16,
    pub rating_clarity: Option<i16>,
    pub rating_material: Option<i16>,
    pub rating_pedagogy: Option<i16>,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub anonymous: bool,
    pub status: String,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub response_text: Option<String>,
    pub responder_id: Option<i64>,
    pub responded_at: Option<i64>,
    pub response_updated_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::offerings::Entity",
        from = "Column::OfferingId",
        to = "super::offerings::Column::Id",
        on_delete = "Restrict"
    )]
    Offering,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Reviewer,
}

impl Related<super::offerings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offering.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviewer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_review(self) -> crate::models::reviews::entities::Review {
        use crate::models::reviews::entities::{ModerationStatus, Review, ReviewReply};
        use crate::models::reviews::rating::{Rating, RatingSet};
        use chrono::{DateTime, Utc};

        let ts = |v: i64| DateTime::<Utc>::from_timestamp(v, 0).unwrap_or_default();
        // 数据库中的评分已在写入时校验过，这里越界值直接视为缺失
        let sub = |v: Option<i16>| v.and_then(|r| Rating::new(i64::from(r)).ok());

        let response = match (self.response_text, self.responder_id, self.responded_at) {
            (Some(text), Some(responder_id), Some(responded_at)) => Some(ReviewReply {
                text,
                responder_id,
                responded_at: ts(responded_at),
                updated_at: self.response_updated_at.map(ts),
            }),
            _ => None,
        };

        Review {
            id: self.id,
            offering_id: self.offering_id,
            reviewer_id: self.reviewer_id,
            ratings: RatingSet {
                overall: Rating::clamped(i64::from(self.rating_overall)),
                clarity: sub(self.rating_clarity),
                material: sub(self.rating_material),
                pedagogy: sub(self.rating_pedagogy),
            },
            comment: self.comment,
            anonymous: self.anonymous,
            status: self
                .status
                .parse::<ModerationStatus>()
                .unwrap_or(ModerationStatus::Pending),
            moderated_by: self.moderated_by,
            moderated_at: self.moderated_at.map(ts),
            response,
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
            deleted_at: self.deleted_at.map(ts),
        }
    }
}
