use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 评价对象类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "offering.ts")]
pub enum OfferingType {
    Course,  // 课程
    Service, // 非课程类服务（图书馆、食堂等）
}

impl OfferingType {
    pub const COURSE: &'static str = "course";
    pub const SERVICE: &'static str = "service";
}

impl<'de> Deserialize<'de> for OfferingType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<OfferingType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的类型: '{s}'. 支持的类型: course, service"
            ))
        })
    }
}

impl std::fmt::Display for OfferingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferingType::Course => write!(f, "{}", OfferingType::COURSE),
            OfferingType::Service => write!(f, "{}", OfferingType::SERVICE),
        }
    }
}

impl std::str::FromStr for OfferingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            OfferingType::COURSE => Ok(OfferingType::Course),
            OfferingType::SERVICE => Ok(OfferingType::Service),
            _ => Err(format!("Invalid offering type: {s}")),
        }
    }
}

// 课程/服务实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct Offering {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub offering_type: OfferingType,
    pub department: String,
    pub responsible_id: Option<i64>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Offering {
    /// 判断是否由该用户负责
    pub fn is_responsible(&self, user_id: i64) -> bool {
        self.responsible_id == Some(user_id)
    }

    pub fn brief(&self) -> OfferingBrief {
        OfferingBrief {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            department: self.department.clone(),
            offering_type: self.offering_type,
        }
    }
}

// 列表/评价中内嵌的简要信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "offering.ts")]
pub struct OfferingBrief {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub department: String,
    pub offering_type: OfferingType,
}
