use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Identity of the caller, inserted into request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

/// Middleware that requires a valid access token.
///
/// Refresh tokens, expired tokens and forged tokens are all rejected with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req).map_err(|reason| {
        tracing::warn!(reason, "Rejected request without usable credentials");
        unauthorized()
    })?;

    let claims = state.authenticator.verify_access(token).map_err(|e| {
        tracing::warn!(error = %e, "Access token validation failed");
        unauthorized()
    })?;

    let identity = claims.identity();
    req.extensions_mut().insert(AuthenticatedUser {
        user_id: UserId(identity.user_id),
        email: identity.email,
    });

    Ok(next.run(req).await)
}

fn unauthorized() -> Response {
    ApiError::Unauthorized("Could not validate credentials".to_string()).into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, &'static str> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "non-ASCII Authorization header")?;

    auth_str
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or("expected Bearer <token>")
}
