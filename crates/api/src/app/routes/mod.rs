use axum::{
    Router,
    routing::{get, post},
};

pub mod session;
pub mod system;
pub mod users;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/users", post(users::create_user))
        .route("/login", post(session::login))
}

/// Routes behind the auth gate.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/me",
            get(users::get_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
}
