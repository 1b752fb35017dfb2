use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, response::Json, Extension};
use tracing::{error, info};

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::error::{invalid_path_id, map_domain_error};
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::UserId;
use crate::domain::service::Service;

fn parse_id(raw: &str, instance: &str) -> Result<UserId, ProblemResponse> {
    raw.parse::<UserId>()
        .map_err(|_| invalid_path_id(raw, instance))
}

/// List all users
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    info!("Listing users");

    match svc.list_users() {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, "/users"))
        }
    }
}

/// Get a specific user by ID
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Getting user with id: {}", raw_id);
    let instance = format!("/users/{}", raw_id);
    let id = parse_id(&raw_id, &instance)?;

    match svc.get_user(id) {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, &instance))
        }
    }
}

/// Create a new user
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    Json(req): Json<CreateUserReq>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    info!("Creating user: {:?}", req);

    match svc.create_user(req.into()) {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, "/users"))
        }
    }
}

/// Replace name and email of an existing user
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
    Json(req): Json<UpdateUserReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Updating user {} with: {:?}", raw_id, req);
    let instance = format!("/users/{}", raw_id);
    let id = parse_id(&raw_id, &instance)?;

    match svc.update_user(id, req.into()) {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, &instance))
        }
    }
}

/// Delete a user by ID
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting user: {}", raw_id);
    let instance = format!("/users/{}", raw_id);
    let id = parse_id(&raw_id, &instance)?;

    match svc.delete_user(id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, &instance))
        }
    }
}
