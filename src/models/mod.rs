pub mod auth;
pub mod common;
pub mod offerings;
pub mod reviews;
pub mod statistics;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery};

