use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::User;
use crate::user::errors::UserError;

pub mod change_password;
pub mod create_user;
pub mod get_user;
pub mod login;
pub mod protected;
pub mod refresh_token;
pub mod update_user;

/// Response header carrying a short machine-oriented reason on password rejections.
pub const X_ERROR: HeaderName = HeaderName::from_static("x-error");

/// Successful response: the payload is serialized as the bare JSON body.
#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    /// 400 with an `X-Error` header explaining the rejection
    Rejected { message: String, reason: &'static str },
    NotFound(String),
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, reason) = match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Rejected { message, reason } => {
                (StatusCode::BAD_REQUEST, message, Some(reason))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
        };

        let mut response =
            (status, Json(ApiErrorBody::new(status, message))).into_response();
        if let Some(reason) = reason {
            response
                .headers_mut()
                .insert(X_ERROR, HeaderValue::from_static(reason));
        }
        response
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            UserError::EmailTaken(_) => ApiError::BadRequest(err.to_string()),
            UserError::InvalidCredentials | UserError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            UserError::WrongCurrentPassword => ApiError::Rejected {
                message: err.to_string(),
                reason: "Current password is incorrect",
            },
            UserError::PasswordUnchanged => ApiError::Rejected {
                message: err.to_string(),
                reason: "New password is the same as the current password",
            },
            UserError::InvalidUserId(_) => ApiError::BadRequest(err.to_string()),
            UserError::InvalidEmail(_) | UserError::InvalidProfile(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            UserError::DatabaseError(_) | UserError::Internal(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    status_code: u16,
    detail: String,
}

impl ApiErrorBody {
    pub fn new(status_code: StatusCode, detail: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            detail,
        }
    }
}

/// Public view of a user record. The password hash is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub home_gym: Option<String>,
    pub grade_style: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.as_str().to_string(),
            first_name: user.profile.first_name().to_string(),
            last_name: user.profile.last_name().to_string(),
            location: user.profile.location().to_string(),
            home_gym: user.profile.home_gym().map(str::to_string),
            grade_style: user.profile.grade_style().to_string(),
            created_at: user.created_at,
        }
    }
}
