//! User endpoints.
//!
//! Every handler runs its work through the boundary logger. Malformed path,
//! query or body input is rejected before that, with the common 400 body.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::server::AppState;
use crate::observability::invocation::RequestMeta;
use crate::users::{PageQuery, PageRequest, UserError, UserRequest};

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

fn rejected(rejection: impl std::fmt::Display) -> UserError {
    UserError::Validation(rejection.to_string())
}

pub async fn list_users(
    State(state): State<AppState>,
    meta: RequestMeta,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, UserError> {
    let Query(query) = query.map_err(rejected)?;
    let call = state
        .logger
        .controller(meta, "users::get_all_users", &[&query], async {
            let request = PageRequest::from_query(&query, &state.pagination)?;
            state.users.get_all_users(request).await.map(Json)
        });
    call.await
}

pub async fn create_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Response, UserError> {
    let Json(request) = payload.map_err(rejected)?;
    let call = state
        .logger
        .controller(meta, "users::create_user", &[&request], async {
            let user = state.users.create_user(request.clone()).await?;
            Ok::<_, UserError>((StatusCode::CREATED, Json(user)))
        });
    call.await
}

pub async fn get_user_by_id(
    State(state): State<AppState>,
    meta: RequestMeta,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, UserError> {
    let Path(id) = id.map_err(rejected)?;
    let call = state
        .logger
        .controller(meta, "users::get_user_by_id", &[&id], async {
            state.users.get_user_by_id(id).await.map(Json)
        });
    call.await
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    meta: RequestMeta,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Response, UserError> {
    let Query(EmailQuery { email }) = query.map_err(rejected)?;
    let call = state
        .logger
        .controller(meta, "users::get_user_by_email", &[&email], async {
            state.users.get_user_by_email(&email).await.map(Json)
        });
    call.await
}

pub async fn delete_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, UserError> {
    let Path(id) = id.map_err(rejected)?;
    let call = state
        .logger
        .controller(meta, "users::delete_user", &[&id], async {
            state.users.delete_user(id).await.map(|()| StatusCode::NO_CONTENT)
        });
    call.await
}

pub async fn health() -> impl IntoResponse {
    Json(HealthStatus {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
    })
}
