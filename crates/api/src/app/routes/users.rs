use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use usergate_auth::{
    ResolvedTarget, RequestContext, TargetRoute, authorize_self_or_admin, require_admin,
};
use usergate_core::{NewUser, UserPatch, UserView};

use crate::app::{dto, errors, services::AppServices};

fn bad_body(rejection: JsonRejection) -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn resolve(
    services: &AppServices,
    ctx: &RequestContext,
    route: TargetRoute,
    requested: Option<&str>,
) -> Result<ResolvedTarget, Response> {
    authorize_self_or_admin(ctx, route, requested, services.target_policy).map_err(|e| {
        tracing::info!(user_id = %ctx.user_id(), ?route, requested, reason = %e, "target access denied");
        errors::authz_error_to_response(e)
    })
}

/// Public registration. Answers with the new user and a ready-to-use token.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return bad_body(rejection),
    };
    if body.password.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "password must not be empty");
    }

    let hash = match services.hash_password(body.password).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::internal_error();
        }
    };

    let new_user = match NewUser::new(body.username, body.email, hash) {
        Ok(u) => u,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let id = match services.store.insert(new_user).await {
        Ok(id) => id,
        Err(e) => return errors::store_error_to_response(e),
    };
    let record = match services.store.find_by_id(id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::error!(user_id = %id, "user vanished right after insert");
            return errors::internal_error();
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let token = match services.issue_token(id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            return errors::internal_error();
        }
    };

    tracing::info!(user_id = %id, username = %record.username, "user registered");
    (
        StatusCode::CREATED,
        Json(dto::CreatedUserResponse::new(&record, token)),
    )
        .into_response()
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    if let Err(e) = require_admin(&ctx) {
        tracing::info!(user_id = %ctx.user_id(), "non-admin tried to list users");
        return errors::authz_error_to_response(e);
    }

    match services.store.list().await {
        Ok(rows) => {
            let items: Vec<UserView> = rows.iter().map(|r| r.view()).collect();
            Json(serde_json::json!({ "items": items })).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::OwnProfile, None) {
        Ok(target) => fetch(&services, target).await,
        Err(res) => res,
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::Explicit, Some(&id)) {
        Ok(target) => fetch(&services, target).await,
        Err(res) => res,
    }
}

pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::OwnProfile, None) {
        Ok(target) => update(&services, target, body).await,
        Err(res) => res,
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::Explicit, Some(&id)) {
        Ok(target) => update(&services, target, body).await,
        Err(res) => res,
    }
}

pub async fn delete_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::OwnProfile, None) {
        Ok(target) => delete(&services, target).await,
        Err(res) => res,
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Response {
    match resolve(&services, &ctx, TargetRoute::Explicit, Some(&id)) {
        Ok(target) => delete(&services, target).await,
        Err(res) => res,
    }
}

// Store operations below only ever see the resolved target id.

async fn fetch(services: &AppServices, target: ResolvedTarget) -> Response {
    match services.store.find_by_id(target.target).await {
        Ok(Some(record)) => Json(record.view()).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn update(
    services: &AppServices,
    target: ResolvedTarget,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body.normalized(),
        Err(rejection) => return bad_body(rejection),
    };
    if body.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "no fields to update");
    }

    let mut patch = match UserPatch::new(body.username, body.email, None) {
        Ok(patch) => patch,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if let Some(password) = body.password {
        match services.hash_password(password).await {
            Ok(hash) => patch.password_hash = Some(hash),
            Err(e) => {
                tracing::error!(error = %e, "password hashing failed");
                return errors::internal_error();
            }
        }
    }

    match services.store.update(target.target, patch).await {
        Ok(Some(record)) => {
            tracing::info!(user_id = %target.target, access = ?target.access, "user updated");
            Json(record.view()).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn delete(services: &AppServices, target: ResolvedTarget) -> Response {
    match services.store.delete(target.target).await {
        Ok(true) => {
            tracing::info!(user_id = %target.target, access = ?target.access, "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
