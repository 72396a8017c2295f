// src/handlers/quiz.rs

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
        quiz::{NewQuiz, QuizFilter},
        user::ActingUser,
    },
    store::Store,
    utils::extract::{ApiJson, ApiPath, ApiQuery},
};

pub async fn list_quizzes(
    State(store): State<Arc<dyn Store>>,
    ApiQuery(filter): ApiQuery<QuizFilter>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes(filter).await?;
    Ok(Json(quizzes))
}

pub async fn get_quiz(
    State(store): State<Arc<dyn Store>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store.get_quiz(id).await?;
    Ok(Json(quiz))
}

/// Questions of a quiz. An unknown quiz has no questions.
pub async fn get_quiz_questions(
    State(store): State<Arc<dyn Store>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store.questions_by_quiz(id).await?;
    Ok(Json(questions))
}

/// Creates a quiz with its question set.
///
/// Every listed question must exist and appear once; otherwise nothing is
/// stored.
pub async fn create_quiz(
    State(store): State<Arc<dyn Store>>,
    Extension(user): Extension<ActingUser>,
    ApiJson(payload): ApiJson<NewQuiz>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question_count = payload.question_ids.len();
    let id = store.create_quiz(payload, user.id).await?;
    tracing::info!(quiz_id = id, user_id = user.id, question_count, "Quiz created");

    Ok((StatusCode::CREATED, Json(json!({ "id": id.to_string() }))))
}

pub async fn delete_quiz(
    State(store): State<Arc<dyn Store>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_quiz(id).await?;
    tracing::info!(quiz_id = id, "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}
