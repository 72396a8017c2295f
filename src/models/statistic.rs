// src/models/statistic.rs

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use sqlx::FromRow;

/// Question count of one top-level subject, including its whole subtree.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubjectStatisticItem {
    #[serde_as(as = "DisplayFromStr")]
    pub subject_id: i64,
    pub subject_name: String,
    pub question_count: i64,
}

/// Raw counts read by the store from a single snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticSnapshot {
    pub quiz_count: i64,
    pub subject_count: i64,
    pub question_count: i64,
    pub question_to_moderate_count: i64,
    pub quiz_count_by_user: i64,
    pub question_count_by_user: i64,
    /// Top-level subjects in hierarchy order.
    pub by_root_subject: Vec<SubjectStatisticItem>,
}

/// Dashboard rollup returned by `GET /statistic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub tests_count: i64,
    pub subject_count: i64,
    pub question_count: i64,
    pub question_to_moderate_count: i64,
    pub test_count_created_by_current_user: i64,
    pub question_count_created_by_current_user: i64,
    pub question_counts_by_subject: Vec<SubjectStatisticItem>,
}
