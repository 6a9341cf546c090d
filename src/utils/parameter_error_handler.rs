//! 请求参数解析失败时的统一响应
//!
//! actix-web 默认返回纯文本，这里改为 `ApiResponse` 信封。

use actix_web::{
    Error, HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError, PathError, QueryPayloadError},
};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

fn bad_request<E>(err: E, req: &HttpRequest, kind: &str) -> Error
where
    E: std::fmt::Display + std::fmt::Debug + 'static,
{
    let message = format!("Invalid {kind}: {err}");
    debug!("{} {} rejected: {}", req.method(), req.path(), message);
    let response =
        HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(ErrorCode::BadRequest, message));
    InternalError::from_response(err, response).into()
}

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            let response = HttpResponse::PayloadTooLarge().json(ApiResponse::<()>::error_empty(
                ErrorCode::BadRequest,
                "Request body is too large",
            ));
            InternalError::from_response(err, response).into()
        }
        _ => bad_request(err, req, "JSON body"),
    }
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    bad_request(err, req, "query parameters")
}

pub fn path_error_handler(err: PathError, req: &HttpRequest) -> Error {
    bad_request(err, req, "path parameters")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, http::StatusCode, test::TestRequest};

    #[test]
    fn test_query_error_is_bad_request() {
        let req = TestRequest::default().to_http_request();
        let err = query_error_handler(
            QueryPayloadError::Deserialize(serde::de::Error::custom("bad limit")),
            &req,
        );
        assert_eq!(err.as_response_error().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_oversized_json_is_payload_too_large() {
        let req = TestRequest::default().to_http_request();
        let err = json_error_handler(JsonPayloadError::Overflow { limit: 10 }, &req);
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
