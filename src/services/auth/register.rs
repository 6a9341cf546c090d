use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::CreateUserRequest},
};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{
    validate_department, validate_email, validate_password, validate_username,
};

use super::AuthService;

type Rejection = (ErrorCode, String);

/// 校验注册请求并规范化院系
///
/// 管理员不能自助注册；学生必须填写院系，否则看不到任何课程。
fn validate_registration(request: &mut CreateUserRequest) -> Result<(), Rejection> {
    if request.role == UserRole::Admin {
        return Err((
            ErrorCode::Forbidden,
            "Administrator accounts cannot be self-registered".to_string(),
        ));
    }

    request.username = request.username.trim().to_string();
    request.email = request.email.trim().to_string();

    validate_username(&request.username)
        .map_err(|msg| (ErrorCode::UserNameInvalid, msg.to_string()))?;
    validate_email(&request.email).map_err(|msg| (ErrorCode::UserEmailInvalid, msg.to_string()))?;

    let password = validate_password(&request.password);
    if !password.is_valid {
        return Err((ErrorCode::UserPasswordInvalid, password.error_message()));
    }

    request.department = match request.department.as_deref() {
        Some(department) => Some(
            validate_department(department)
                .map_err(|msg| (ErrorCode::UserDepartmentInvalid, msg.to_string()))?,
        ),
        None if request.role == UserRole::Student => {
            return Err((
                ErrorCode::UserDepartmentInvalid,
                "Students must register with a department".to_string(),
            ));
        }
        None => None,
    };

    request.display_name = request
        .display_name
        .take()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(())
}

fn rejection_response((code, message): Rejection) -> HttpResponse {
    match code {
        ErrorCode::Forbidden => {
            HttpResponse::Forbidden().json(ApiResponse::error_empty(code, message))
        }
        ErrorCode::UserNameAlreadyExists | ErrorCode::UserEmailAlreadyExists => {
            HttpResponse::Conflict().json(ApiResponse::error_empty(code, message))
        }
        ErrorCode::RegisterFailed => {
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(code, message))
        }
        _ => HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message)),
    }
}

async fn check_unique(
    storage: &std::sync::Arc<dyn Storage>,
    request: &CreateUserRequest,
) -> Result<(), Rejection> {
    let failed = |e: crate::errors::FeedbackError| (ErrorCode::RegisterFailed, format!("Register failed: {e}"));

    if storage
        .get_user_by_username(&request.username)
        .await
        .map_err(failed)?
        .is_some()
    {
        return Err((
            ErrorCode::UserNameAlreadyExists,
            "Username already exists".to_string(),
        ));
    }

    if storage
        .get_user_by_email(&request.email)
        .await
        .map_err(failed)?
        .is_some()
    {
        return Err((
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists".to_string(),
        ));
    }

    Ok(())
}

pub async fn handle_register(
    service: &AuthService,
    mut create_request: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    if let Err(rejection) = validate_registration(&mut create_request) {
        return Ok(rejection_response(rejection));
    }

    if let Err(rejection) = check_unique(&storage, &create_request).await {
        return Ok(rejection_response(rejection));
    }

    // 将明文密码替换为哈希
    create_request.password = match hash_password(&create_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Password hashing failed: {}", e);
            return Ok(rejection_response((
                ErrorCode::RegisterFailed,
                "Register failed".to_string(),
            )));
        }
    };

    match storage.create_user(create_request).await {
        Ok(user) => {
            tracing::info!("Registered {} {} ({})", user.role, user.username, user.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            Ok(rejection_response((
                ErrorCode::RegisterFailed,
                "Register failed".to_string(),
            )))
        }
    }
}
