// src/store/mod.rs

//! Entity Store: persistence contract for subjects, questions and quizzes.
//!
//! Two backends implement it: [`postgres::PgStore`] for production and
//! [`memory::MemoryStore`] for tests and database-less runs. Both enforce the
//! same existence, uniqueness and hierarchy rules.

pub mod memory;
pub mod path;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::{
            NewQuestion, Question, QuestionFilter, QuestionStatus, QuestionStatusEntry,
            QuestionType, QuestionUpdate,
        },
        quiz::{NewQuiz, Quiz, QuizFilter},
        statistic::StatisticSnapshot,
        subject::{NewSubject, Subject, UpdateSubject},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// All subjects in hierarchy order, with direct question counts.
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError>;

    async fn create_subject(
        &self,
        subject: NewSubject,
        creator_user_id: i64,
    ) -> Result<i64, AppError>;

    async fn update_subject(&self, subject: UpdateSubject) -> Result<(), AppError>;

    /// Removes the subject with its subtree; its questions lose their subject.
    async fn delete_subject(&self, id: i64) -> Result<(), AppError>;

    /// Reads every count of the statistics rollup from one consistent snapshot.
    async fn statistic_snapshot(&self, user_id: i64) -> Result<StatisticSnapshot, AppError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, AppError>;

    async fn get_question(&self, id: i64) -> Result<Question, AppError>;

    async fn question_types(&self) -> Result<Vec<QuestionType>, AppError>;

    async fn question_statuses(&self) -> Result<Vec<QuestionStatusEntry>, AppError>;

    async fn create_question(&self, question: NewQuestion) -> Result<i64, AppError>;

    /// Rewrites content and moderation fields. Creator is left untouched.
    async fn update_question(&self, id: i64, update: QuestionUpdate) -> Result<(), AppError>;

    /// Narrow status-only write used by explicit moderation.
    async fn update_question_status(&self, id: i64, status: QuestionStatus)
    -> Result<(), AppError>;

    async fn delete_question(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn list_quizzes(&self, filter: QuizFilter) -> Result<Vec<Quiz>, AppError>;

    /// Questions linked to the quiz; empty when the quiz does not exist.
    async fn questions_by_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError>;

    /// Inserts the quiz and links every requested question atomically.
    /// Fails without leaving anything behind when a link cannot be made.
    async fn create_quiz(&self, quiz: NewQuiz, creator_user_id: i64) -> Result<i64, AppError>;

    /// Removes the quiz and its question links atomically.
    async fn delete_quiz(&self, id: i64) -> Result<(), AppError>;
}

/// Full store used by the application state.
pub trait Store: SubjectStore + QuestionStore + QuizStore {}

impl<T: SubjectStore + QuestionStore + QuizStore> Store for T {}

/// Message used when a quiz cannot link all requested questions.
pub(crate) fn link_mismatch(requested: usize, linked: u64) -> AppError {
    AppError::Execution(format!(
        "questions to link: {}, questions linked: {}",
        requested, linked
    ))
}
