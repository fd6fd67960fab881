use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Deserializer;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn update_user(
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let user_id = UserId::try_from(req.user_id).map_err(UserError::from)?;

    state
        .account_service
        .update_user(&user_id, req.updates.into())
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// HTTP request body for updating a user (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user_id: i64,
    pub updates: ProfileUpdates,
}

/// Profile fields accepted by `/update_user/`. Any other key is rejected.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdates {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Absent keeps the gym, `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub home_gym: Option<Option<String>>,
    #[serde(default)]
    pub grade_style: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<ProfileUpdates> for UpdateUserCommand {
    fn from(updates: ProfileUpdates) -> Self {
        UpdateUserCommand {
            first_name: updates.first_name,
            last_name: updates.last_name,
            location: updates.location,
            home_gym: updates.home_gym,
            grade_style: updates.grade_style,
        }
    }
}
