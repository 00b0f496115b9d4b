use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use usergate_auth::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": ctx.user_id(),
        "is_admin": ctx.is_admin(),
    }))
}
