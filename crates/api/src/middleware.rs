//! Request gate: bearer authentication in front of every protected route.
//!
//! Order of checks: header presence → `Bearer ` prefix → signature/expiry →
//! (optional) subject liveness. Each failure is a terminal, uniform 401; the
//! precise reason goes to the logs only. Target authorization happens in the
//! handlers, which know the path parameters.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use usergate_auth::{AuthError, Authenticator, RequestContext};
use usergate_infra::UserStore;

use crate::app::errors;

#[derive(Clone)]
pub struct GateState {
    pub authenticator: Authenticator,
    /// Present when tokens of deleted users must be refused.
    pub liveness: Option<Arc<dyn UserStore>>,
}

enum Rejection {
    Unauthorized(AuthError),
    Store(usergate_infra::StoreError),
}

pub async fn auth_middleware(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let outcome = authenticate_request(&gate, req.headers()).await;
    match outcome {
        Ok(ctx) => {
            if ctx.is_admin() {
                tracing::debug!(user_id = %ctx.user_id(), %method, %path, "admin request");
            }
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(Rejection::Unauthorized(reason)) => {
            tracing::warn!(%reason, %method, %path, "request rejected by auth gate");
            errors::unauthorized()
        }
        Err(Rejection::Store(e)) => {
            tracing::error!(error = %e, %method, %path, "identity liveness check failed");
            errors::internal_error()
        }
    }
}

async fn authenticate_request(
    gate: &GateState,
    headers: &HeaderMap,
) -> Result<RequestContext, Rejection> {
    let header = match headers.get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| Rejection::Unauthorized(AuthError::MalformedHeader))?,
        ),
    };

    let ctx = gate
        .authenticator
        .authenticate(header, Utc::now())
        .map_err(Rejection::Unauthorized)?;

    if let Some(store) = &gate.liveness {
        match store.find_by_id(ctx.user_id()).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(Rejection::Unauthorized(AuthError::UnknownIdentity)),
            Err(e) => return Err(Rejection::Store(e)),
        }
    }

    Ok(ctx)
}
