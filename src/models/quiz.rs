// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, NoneAsEmptyString, serde_as};
use sqlx::FromRow;
use validator::Validate;

/// A named collection of questions.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde_as(as = "DisplayFromStr")]
    pub creator_user_id: i64,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub question_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /quiz`. The creator is the acting user.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewQuiz {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[serde(default)]
    pub question_ids: Vec<i64>,
}

/// Query parameters of `GET /quizzes`. An empty value means "no filter".
#[serde_as]
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct QuizFilter {
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub creator_user_id: Option<i64>,
}
