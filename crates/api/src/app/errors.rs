use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::IntoResponse;
use serde_json::json;

use usergate_auth::AuthzError;
use usergate_infra::StoreError;

/// Every error body has the shape `{"error": "<message>"}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

/// Uniform authentication failure; the reason is never echoed to the client.
pub fn unauthorized() -> axum::response::Response {
    let mut res = json_error(StatusCode::UNAUTHORIZED, "unauthorized");
    res.headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}

pub fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden"),
        AuthzError::InvalidTarget(msg) => json_error(StatusCode::BAD_REQUEST, msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "user store failure");
            internal_error()
        }
    }
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "user not found")
}
