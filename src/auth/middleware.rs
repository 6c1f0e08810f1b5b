use axum::{
    extract::{FromRef, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{auth::jwt::JwtKeys, auth::repo::User, error::ApiError, state::AppState};

/// The user resolved by the access gate, available to downstream handlers
/// through request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Access gate for protected routes, composed onto sub-routers with
/// `middleware::from_fn_with_state`. Terminal outcomes per request:
/// missing token 401, invalid or expired token 401, subject row gone 404,
/// store fault 500, otherwise the request proceeds with `CurrentUser`
/// attached.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_access(token).map_err(|e| {
        warn!("invalid or expired token");
        e
    })?;

    // Tokens reference users weakly: the row is re-resolved on every request,
    // so a token whose subject no longer exists stops working.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::TokenMissing)?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::TokenMissing)
}
