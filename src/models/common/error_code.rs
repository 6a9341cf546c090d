use serde::Serialize;

/// 业务错误码，随 `ApiResponse` 一同返回
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    RateLimitExceeded = 1029,

    // 认证与用户
    AuthFailed = 2000,
    RegisterFailed = 2001,
    UserNameInvalid = 2002,
    UserEmailInvalid = 2003,
    UserPasswordInvalid = 2004,
    UserNameAlreadyExists = 2005,
    UserEmailAlreadyExists = 2006,
    UserNotFound = 2007,
    UserDepartmentInvalid = 2008,

    // 课程/服务
    OfferingNotFound = 3000,
    OfferingCodeAlreadyExists = 3001,
    OfferingInvalid = 3002,

    // 评价
    ReviewNotFound = 4000,
    ReviewValidationFailed = 4001,
    InvalidRating = 4002,
    DuplicateReview = 4003,
    InvalidTransition = 4004,
    AlreadyResponded = 4005,
    ResponseNotFound = 4006,
}
