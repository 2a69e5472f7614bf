use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

use crate::{
    auth::policy,
    handlers::{admin, auth},
    state::AppState,
};

/// Routes are registered flat (no nesting) so the matched path seen by
/// the policy layer is exactly the string listed in its table.
pub fn app_router(state: Arc<AppState>) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let login = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(GovernorLayer::new(governor_conf));

    let gated = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/sessions/{username}", delete(admin::revoke_session))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            policy::enforce,
        ));

    Router::new()
        .route("/healthz", get(health))
        .route("/auth/logout", post(auth::logout))
        .merge(login)
        .merge(gated)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
