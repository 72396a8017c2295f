// src/handlers/question.rs

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
        question::{InputQuestion, ModerateRequest, QuestionFilter},
        user::ActingUser,
    },
    notifier::Notifier,
    services::moderation,
    store::Store,
    utils::extract::{ApiJson, ApiPath, ApiQuery},
};

/// Lists questions. Each query parameter that is present narrows the list.
pub async fn list_questions(
    State(store): State<Arc<dyn Store>>,
    ApiQuery(filter): ApiQuery<QuestionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store.list_questions(filter).await?;
    Ok(Json(questions))
}

pub async fn get_question(
    State(store): State<Arc<dyn Store>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = store.get_question(id).await?;
    Ok(Json(question))
}

pub async fn list_types(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.question_types().await?))
}

pub async fn list_statuses(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.question_statuses().await?))
}

/// Submits a question.
///
/// * Admins and moderators get it approved immediately.
/// * Anyone else queues it and notifies the moderation rooms.
pub async fn create_question(
    State(store): State<Arc<dyn Store>>,
    State(notifier): State<Arc<dyn Notifier>>,
    Extension(user): Extension<ActingUser>,
    ApiJson(payload): ApiJson<InputQuestion>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id =
        moderation::submit_question(store.as_ref(), notifier.as_ref(), &user, payload).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id.to_string() }))))
}

/// Rewrites a question; moderation is decided again for the editor.
pub async fn update_question(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<InputQuestion>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    moderation::edit_question(store.as_ref(), &user, id, payload).await?;
    Ok(StatusCode::OK)
}

pub async fn moderate_question(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ModerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(comment) = payload.comment.as_deref().filter(|c| !c.is_empty()) {
        tracing::debug!(question_id = id, comment, "Moderation comment received");
    }

    moderation::moderate_question(store.as_ref(), &user, id, payload.approve).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_question(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    moderation::delete_question(store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
