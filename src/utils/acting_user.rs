// src/utils/acting_user.rs

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::{ActingUser, Role},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing or unreadable {} header", name)))
}

/// Reads the acting user from the headers injected by the upstream gateway.
pub fn acting_user_from_headers(headers: &HeaderMap) -> Result<ActingUser, AppError> {
    let id = header_value(headers, USER_ID_HEADER)?
        .parse::<i64>()
        .map_err(|_| AppError::Validation("Malformed user id".to_string()))?;
    let role = header_value(headers, USER_ROLE_HEADER)?.parse::<Role>()?;

    Ok(ActingUser::new(id, role))
}

/// Axum Middleware: Acting User.
///
/// Injects `ActingUser` into the request extensions. Requests without a
/// valid id and role are rejected with 400 before any handler runs.
pub async fn acting_user_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = acting_user_from_headers(req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
