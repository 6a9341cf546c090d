//! 预导入模块，方便使用

pub use super::offerings::{
    ActiveModel as OfferingActiveModel, Entity as Offerings, Model as OfferingModel,
};
pub use super::reviews::{ActiveModel as ReviewActiveModel, Entity as Reviews, Model as ReviewModel};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
