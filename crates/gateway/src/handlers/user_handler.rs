//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use common::{AppError, AppResult, OptionExt};
use domain::{User, UserData};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// User create/update request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UserRequest {
    /// Display name
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(min = 3, max = 50, message = "Name must be between 3 and 50 characters")
    )]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// Email address, unique across users
    #[validate(
        custom(function = "not_blank", message = "Email is required"),
        email(message = "Email format is invalid")
    )]
    #[schema(example = "jane@example.com")]
    pub email: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl From<UserRequest> for UserData {
    fn from(request: UserRequest) -> Self {
        UserData::new(request.name, request.email)
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/email/:email", get(get_user_by_email))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.user_service.create_user(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of all users", body = Vec<User>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.user_service.get_user(id).await?.ok_or_not_found()?;
    Ok(Json(user))
}

/// Get user by email
#[utoipa::path(
    get,
    path = "/users/email/{email}",
    tag = "Users",
    params(
        ("email" = String, Path, description = "User email address")
    ),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<User>> {
    let user = state
        .user_service
        .get_user_by_email(&email)
        .await?
        .ok_or_not_found()?;
    Ok(Json(user))
}

/// Replace name and email of a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = User),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> AppResult<Json<User>> {
    let user = state
        .user_service
        .update_user(id, payload.into())
        .await?
        .ok_or_not_found()?;
    Ok(Json(user))
}

/// Permanently delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.user_service.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
