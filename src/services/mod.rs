pub mod auth;
pub mod offerings;
pub mod reviews;
pub mod statistics;
pub mod users;

pub use auth::AuthService;
pub use offerings::OfferingService;
pub use reviews::ReviewService;
pub use statistics::StatisticsService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, http::StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::cache::ObjectCache;
use crate::errors::{FeedbackError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, users::entities::Actor};
use crate::storage::Storage;

/// 从 app data 中取存储
pub(crate) fn storage_from_request(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

/// 缓存是可选的，未注册时直接走存储
pub(crate) fn cache_from_request(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

/// 当前请求的参与者，需要 RequireJWT 在前
pub(crate) fn current_actor(request: &HttpRequest) -> Result<Actor> {
    RequireJWT::extract_actor(request)
        .ok_or_else(|| FeedbackError::authentication("Unauthorized access, please login"))
}

/// 各业务域在响应中使用的错误码
#[derive(Debug, Clone, Copy)]
pub(crate) struct ErrorCodes {
    pub not_found: ErrorCode,
    pub invalid: ErrorCode,
}

impl ErrorCodes {
    pub const GENERAL: Self = Self {
        not_found: ErrorCode::NotFound,
        invalid: ErrorCode::BadRequest,
    };
    pub const OFFERING: Self = Self {
        not_found: ErrorCode::OfferingNotFound,
        invalid: ErrorCode::OfferingInvalid,
    };
    pub const REVIEW: Self = Self {
        not_found: ErrorCode::ReviewNotFound,
        invalid: ErrorCode::ReviewValidationFailed,
    };
    pub const RESPONSE: Self = Self {
        not_found: ErrorCode::ResponseNotFound,
        invalid: ErrorCode::ReviewValidationFailed,
    };
    pub const USER: Self = Self {
        not_found: ErrorCode::UserNotFound,
        invalid: ErrorCode::BadRequest,
    };
}

fn status_and_code(err: &FeedbackError, codes: ErrorCodes) -> (StatusCode, ErrorCode) {
    match err {
        FeedbackError::Validation(_) => (StatusCode::BAD_REQUEST, codes.invalid),
        FeedbackError::InvalidRating(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidRating),
        FeedbackError::NotFound(_) => (StatusCode::NOT_FOUND, codes.not_found),
        FeedbackError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        FeedbackError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        FeedbackError::DuplicateReview(_) => (StatusCode::CONFLICT, ErrorCode::DuplicateReview),
        FeedbackError::InvalidTransition(_) => {
            (StatusCode::CONFLICT, ErrorCode::InvalidTransition)
        }
        FeedbackError::AlreadyResponded(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyResponded),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 把领域错误转换为带信封的 HTTP 响应
pub(crate) fn error_response(err: &FeedbackError, codes: ErrorCodes) -> HttpResponse {
    let (status, code) = status_and_code(err, codes);
    if status.is_server_error() {
        error!("{}", err.format_simple());
        return HttpResponse::build(status)
            .json(ApiResponse::error_empty(code, "Internal server error"));
    }
    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (FeedbackError::validation("x"), StatusCode::BAD_REQUEST),
            (FeedbackError::invalid_rating("x"), StatusCode::BAD_REQUEST),
            (FeedbackError::forbidden("x"), StatusCode::FORBIDDEN),
            (FeedbackError::not_found("x"), StatusCode::NOT_FOUND),
            (FeedbackError::duplicate_review("x"), StatusCode::CONFLICT),
            (FeedbackError::invalid_transition("x"), StatusCode::CONFLICT),
            (FeedbackError::already_responded("x"), StatusCode::CONFLICT),
            (FeedbackError::authentication("x"), StatusCode::UNAUTHORIZED),
            (
                FeedbackError::database_operation("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(&err, ErrorCodes::GENERAL).status(), status);
        }
    }

    #[test]
    fn test_domain_specific_codes() {
        let (_, code) = status_and_code(&FeedbackError::not_found("x"), ErrorCodes::REVIEW);
        assert_eq!(code, ErrorCode::ReviewNotFound);
        let (_, code) = status_and_code(&FeedbackError::validation("x"), ErrorCodes::OFFERING);
        assert_eq!(code, ErrorCode::OfferingInvalid);
    }
}
