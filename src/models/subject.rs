// src/models/subject.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use sqlx::FromRow;
use validator::Validate;

/// A node of the subject taxonomy, with denormalized question counts.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subject {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde_as(as = "DisplayFromStr")]
    pub creator_user_id: i64,
    pub active: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Questions attached directly to this subject.
    pub question_count: i64,
    /// Approved questions attached directly to this subject.
    pub approved_question_count: i64,
}

/// Body of `POST /subject`. The creator is the acting user.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSubject {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub parent_id: Option<i64>,
}

/// Body of `PUT /subject`.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSubject {
    #[serde_as(as = "DisplayFromStr")]
    pub id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub parent_id: Option<i64>,
}

fn default_active() -> bool {
    true
}
