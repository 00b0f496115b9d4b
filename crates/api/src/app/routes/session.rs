use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{dto, errors, services::AppServices};

/// Exchange username + password for a bearer token.
///
/// Unknown users and wrong passwords get the same 401.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid request body");
    };

    let user = match services.store.find_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            services.verify_unknown_user(body.password).await;
            tracing::info!(username = %body.username, "login for unknown user");
            return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if !services
        .verify_password(user.password_hash.clone(), body.password)
        .await
    {
        tracing::info!(user_id = %user.id, "login with wrong password");
        return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    match services.issue_token(user.id) {
        Ok(token) => {
            tracing::info!(user_id = %user.id, "login succeeded");
            (StatusCode::CREATED, Json(dto::TokenResponse { token })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            errors::internal_error()
        }
    }
}
