//! Declarative route access control. Protected routes appear in one
//! table; the `enforce` layer matches the request against it and
//! denies anything unlisted.

use axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::{auth::guard::AuthPrincipal, errors::AppError, models::user::Role};

const ROUTE_ROLES: &[(&str, &str, &[Role])] = &[
    ("GET", "/auth/me", &Role::ALL),
    ("GET", "/admin/users", &[Role::Admin, Role::Manager]),
    ("POST", "/admin/users", &[Role::Admin]),
    ("DELETE", "/admin/sessions/{username}", &[Role::Admin]),
];

pub fn allowed_roles(method: &Method, route: &str) -> Option<&'static [Role]> {
    ROUTE_ROLES
        .iter()
        .find(|(m, r, _)| *m == method.as_str() && *r == route)
        .map(|(_, _, roles)| *roles)
}

/// Layer for every protected route. `AuthPrincipal` has already run
/// the full token validation; this adds the role check and caches the
/// resolved user for the handler.
pub async fn enforce(
    matched: MatchedPath,
    AuthPrincipal(user): AuthPrincipal,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let roles = allowed_roles(req.method(), matched.as_str()).ok_or(AppError::Forbidden)?;
    if !roles.contains(&user.role) {
        return Err(AppError::Forbidden);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
