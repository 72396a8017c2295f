// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, NoneAsEmptyString, serde_as};
use sqlx::FromRow;
use validator::Validate;

use crate::models::document::{Document, validate_document_size};

/// Lifecycle stage of a question.
///
/// Discriminants match the seeded ids of the `question_status` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionStatus {
    /// Waiting for moderation.
    Created = 1,
    Approved = 2,
    Declined = 3,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 3] = [
        QuestionStatus::Created,
        QuestionStatus::Approved,
        QuestionStatus::Declined,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            QuestionStatus::Created => "Created",
            QuestionStatus::Approved => "Approved",
            QuestionStatus::Declined => "Declined",
        }
    }
}

/// Row of the `question_type` lookup table.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QuestionType {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    pub name: String,
}

/// Row of the `question_status` lookup table, as listed by `GET /statuses`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QuestionStatusEntry {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    pub name: String,
}

impl From<QuestionStatus> for QuestionStatusEntry {
    fn from(status: QuestionStatus) -> Self {
        Self {
            id: status.id(),
            name: status.name().to_string(),
        }
    }
}

/// A question as returned to clients.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    pub text: String,
    pub code: String,
    pub variants: Document,
    pub answer: Document,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub status: QuestionStatus,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subject_id: Option<i64>,
    pub subject_name: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub creator_user_id: i64,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub moderator_user_id: Option<i64>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /question` and `PUT /question/{id}`.
///
/// Status and moderation fields are deliberately absent: they are derived
/// from the acting user's role, never taken from the caller.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InputQuestion {
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub text: String,

    #[serde(default)]
    #[validate(length(max = 10000))]
    pub code: String,

    #[serde(default)]
    #[validate(custom(function = validate_document_size))]
    pub variants: Document,

    #[serde(default)]
    #[validate(custom(function = validate_document_size))]
    pub answer: Document,

    #[serde_as(as = "DisplayFromStr")]
    pub type_id: i64,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subject_id: Option<i64>,
}

/// Moderation fields decided for a submission or edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub status: QuestionStatus,
    pub moderator_user_id: Option<i64>,
    pub moderated_at: Option<DateTime<Utc>>,
}

/// Insert payload handed to the store.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub content: InputQuestion,
    pub creator_user_id: i64,
    pub moderation: ModerationOutcome,
}

/// Update payload handed to the store. Authorship is not part of it.
#[derive(Debug, Clone)]
pub struct QuestionUpdate {
    pub content: InputQuestion,
    pub moderation: ModerationOutcome,
}

/// Query parameters of `GET /questions`. An absent or empty value means
/// "no filter".
#[serde_as]
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct QuestionFilter {
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub creator_user_id: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub subject_id: Option<i64>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub status_id: Option<i64>,
}

/// Body of `PUT /question/{id}/moderate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerateRequest {
    pub approve: bool,
    /// Accepted but not stored yet.
    #[serde(default)]
    pub comment: Option<String>,
}
