use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn protected_route(
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<ProtectedResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        ProtectedResponseData {
            message: format!("Hello, {}", user.email),
            user_id: user.user_id.0,
            email: user.email,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedResponseData {
    pub message: String,
    pub user_id: i64,
    pub email: String,
}
