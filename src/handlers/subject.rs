// src/handlers/subject.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        subject::{NewSubject, UpdateSubject},
        user::ActingUser,
    },
    services::statistics,
    store::Store,
    utils::extract::{ApiJson, ApiPath},
};

/// Lists every subject in hierarchy order with its question counts.
pub async fn list_subjects(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = store.list_subjects().await?;
    Ok(Json(subjects))
}

/// Creates a subject owned by the acting user.
pub async fn create_subject(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
    ApiJson(payload): ApiJson<NewSubject>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = store.create_subject(payload, user.id).await?;
    tracing::info!(subject_id = id, user_id = user.id, "Subject created");

    Ok((StatusCode::CREATED, Json(json!({ "id": id.to_string() }))))
}

/// Updates a subject. Changing `parent_id` moves its whole subtree.
pub async fn update_subject(
    State(store): State<Arc<dyn Store>>,
    ApiJson(payload): ApiJson<UpdateSubject>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = payload.id;
    store.update_subject(payload).await?;
    tracing::info!(subject_id = id, "Subject updated");

    Ok(StatusCode::OK)
}

pub async fn delete_subject(
    State(store): State<Arc<dyn Store>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_subject(id).await?;
    tracing::info!(subject_id = id, "Subject deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard counters for the acting user.
pub async fn get_statistic(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
) -> Result<impl IntoResponse, AppError> {
    let statistic = statistics::get_statistic(store.as_ref(), &user).await?;
    Ok(Json(statistic))
}
