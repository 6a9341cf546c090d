//! 评价引擎
//!
//! 纯函数实现的领域规则，不依赖 HTTP 与数据库：
//! - `guard`: 重复提交检查与按 (评价人, 对象) 的提交锁
//! - `moderation`: 审核状态机与各类操作的权限判定
//! - `aggregation`: 统计聚合
//! - `visibility`: 按角色与院系的可见性策略

pub mod aggregation;
pub mod guard;
pub mod moderation;
pub mod visibility;

use crate::config::ReviewConfig;

/// 评价相关的可配置策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPolicy {
    pub min_comment_length: usize,
    pub rejected_blocks_resubmission: bool,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::from(&ReviewConfig::default())
    }
}

impl From<&ReviewConfig> for ReviewPolicy {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            min_comment_length: config.min_comment_length,
            rejected_blocks_resubmission: config.rejected_blocks_resubmission,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::models::offerings::entities::{Offering, OfferingType};
    use crate::models::reviews::entities::{ModerationStatus, Review};
    use crate::models::reviews::rating::{Rating, RatingSet};
    use crate::models::users::entities::{Actor, UserRole};

    pub fn actor(id: i64, role: UserRole, department: Option<&str>) -> Actor {
        Actor {
            id,
            role,
            department: department.map(str::to_string),
            active: true,
        }
    }

    pub fn student(id: i64, department: &str) -> Actor {
        actor(id, UserRole::Student, Some(department))
    }

    pub fn teacher(id: i64) -> Actor {
        actor(id, UserRole::Teacher, None)
    }

    pub fn admin(id: i64) -> Actor {
        actor(id, UserRole::Admin, None)
    }

    pub fn offering(id: i64, department: &str) -> Offering {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Offering {
            id,
            code: format!("OFF{id}"),
            name: format!("Offering {id}"),
            description: None,
            offering_type: OfferingType::Course,
            department: department.to_string(),
            responsible_id: None,
            credits: None,
            semester: None,
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn review(
        id: i64,
        offering_id: i64,
        reviewer_id: i64,
        overall: i64,
        status: ModerationStatus,
    ) -> Review {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        Review {
            id,
            offering_id,
            reviewer_id,
            ratings: RatingSet {
                overall: Rating::new(overall).unwrap(),
                clarity: None,
                material: None,
                pedagogy: None,
            },
            comment: "A perfectly reasonable comment".to_string(),
            anonymous: false,
            status,
            moderated_by: None,
            moderated_at: None,
            response: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    pub fn approved(id: i64, offering_id: i64, reviewer_id: i64, overall: i64) -> Review {
        review(id, offering_id, reviewer_id, overall, ModerationStatus::Approved)
    }
}
