// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction, types::Json};

use crate::{
    error::AppError,
    models::{
        document::Document,
        question::{
            NewQuestion, Question, QuestionFilter, QuestionStatus, QuestionStatusEntry,
            QuestionType, QuestionUpdate,
        },
        quiz::{NewQuiz, Quiz, QuizFilter},
        statistic::{StatisticSnapshot, SubjectStatisticItem},
        subject::{NewSubject, Subject, UpdateSubject},
    },
    store::{QuestionStore, QuizStore, SubjectStore, link_mismatch},
};

/// Postgres-backed store. Every call goes to the database; nothing is cached.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Opens a repeatable-read transaction. Dropping it without commit rolls back.
async fn begin(pool: &PgPool, read_only: bool) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;
    let mode = if read_only {
        "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY"
    } else {
        "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ WRITE"
    };
    sqlx::query(mode).execute(&mut *tx).await?;
    Ok(tx)
}

/// `ltree` compares labels as text; the path is ordered as a `bigint[]` instead
/// so that `1.4` sorts before `1.10`, the same as `SubjectPath`.
const SUBJECT_SELECT: &str = r#"
    SELECT
        s.id, s.name, s.description, s.creator_user_id, s.active, s.parent_id,
        s.created_at, s.updated_at,
        COUNT(q.id) AS question_count,
        COUNT(q.id) FILTER (WHERE q.status_id = $1) AS approved_question_count
    FROM subject s
    LEFT JOIN question q ON q.subject_id = s.id
    GROUP BY s.id
    ORDER BY string_to_array(s.path::text, '.')::bigint[]
"#;

const QUESTION_SELECT: &str = r#"
    SELECT
        q.id, q.text, q.code, q.variants, q.answer,
        q.type_id, qt.name AS type_name,
        q.status_id, q.subject_id, s.name AS subject_name,
        q.creator_user_id, q.moderator_user_id, q.moderated_at, q.created_at
    FROM question q
    JOIN question_type qt ON qt.id = q.type_id
    LEFT JOIN subject s ON s.id = q.subject_id
"#;

const QUIZ_SELECT: &str = r#"
    SELECT
        z.id, z.name, z.description, z.creator_user_id, z.created_at, z.updated_at,
        ARRAY(
            SELECT qq.question_id FROM quizzes_questions qq
            WHERE qq.quiz_id = z.id
            ORDER BY qq.question_id
        ) AS question_ids
    FROM quiz z
"#;

/// Flat row of `QUESTION_SELECT`.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    text: String,
    code: String,
    variants: Json<serde_json::Value>,
    answer: Json<serde_json::Value>,
    type_id: i64,
    type_name: String,
    status_id: i64,
    subject_id: Option<i64>,
    subject_name: Option<String>,
    creator_user_id: i64,
    moderator_user_id: Option<i64>,
    moderated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let status = QuestionStatus::from_id(row.status_id).ok_or_else(|| {
            AppError::Internal(format!("Unknown question status id {}", row.status_id))
        })?;

        Ok(Question {
            id: row.id,
            text: row.text,
            code: row.code,
            variants: Document(row.variants.0),
            answer: Document(row.answer.0),
            question_type: QuestionType {
                id: row.type_id,
                name: row.type_name,
            },
            status,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            creator_user_id: row.creator_user_id,
            moderator_user_id: row.moderator_user_id,
            moderated_at: row.moderated_at,
            created_at: row.created_at,
        })
    }
}

fn into_questions(rows: Vec<QuestionRow>) -> Result<Vec<Question>, AppError> {
    rows.into_iter().map(Question::try_from).collect()
}

#[derive(FromRow)]
struct CountsRow {
    quiz_count: i64,
    subject_count: i64,
    question_count: i64,
    question_to_moderate_count: i64,
    quiz_count_by_user: i64,
    question_count_by_user: i64,
}

#[async_trait]
impl SubjectStore for PgStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(SUBJECT_SELECT)
            .bind(QuestionStatus::Approved.id())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list subjects: {:?}", e);
                AppError::from(e)
            })?;

        Ok(subjects)
    }

    async fn create_subject(
        &self,
        subject: NewSubject,
        creator_user_id: i64,
    ) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO subject (name, description, creator_user_id, active, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(creator_user_id)
        .bind(subject.active)
        .bind(subject.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::AlreadyExists(_) => {
                AppError::AlreadyExists(format!("Subject '{}' already exists", subject.name))
            }
            other => other,
        })?;

        Ok(id)
    }

    async fn update_subject(&self, subject: UpdateSubject) -> Result<(), AppError> {
        // The path triggers rewrite the subtree in the same statement.
        let result = sqlx::query(
            r#"
            UPDATE subject
            SET name = $1, description = $2, active = $3, parent_id = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(subject.active)
        .bind(subject.parent_id)
        .bind(subject.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }

        Ok(())
    }

    async fn delete_subject(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subject WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subject not found".to_string()));
        }

        Ok(())
    }

    async fn statistic_snapshot(&self, user_id: i64) -> Result<StatisticSnapshot, AppError> {
        let mut tx = begin(&self.pool, true).await?;

        let counts = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM quiz) AS quiz_count,
                (SELECT COUNT(*) FROM subject) AS subject_count,
                (SELECT COUNT(*) FROM question) AS question_count,
                (SELECT COUNT(*) FROM question WHERE status_id = $2) AS question_to_moderate_count,
                (SELECT COUNT(*) FROM quiz WHERE creator_user_id = $1) AS quiz_count_by_user,
                (SELECT COUNT(*) FROM question WHERE creator_user_id = $1) AS question_count_by_user
            "#,
        )
        .bind(user_id)
        .bind(QuestionStatus::Created.id())
        .fetch_one(&mut *tx)
        .await?;

        // Each root counts the questions of every subject whose path lies under it.
        let by_root_subject = sqlx::query_as::<_, SubjectStatisticItem>(
            r#"
            SELECT
                root.id AS subject_id,
                root.name AS subject_name,
                COUNT(q.id) AS question_count
            FROM subject root
            LEFT JOIN subject member ON member.path <@ root.path
            LEFT JOIN question q ON q.subject_id = member.id
            WHERE root.parent_id IS NULL
            GROUP BY root.id, root.name, root.path
            ORDER BY string_to_array(root.path::text, '.')::bigint[]
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(StatisticSnapshot {
            quiz_count: counts.quiz_count,
            subject_count: counts.subject_count,
            question_count: counts.question_count,
            question_to_moderate_count: counts.question_to_moderate_count,
            quiz_count_by_user: counts.quiz_count_by_user,
            question_count_by_user: counts.question_count_by_user,
            by_root_subject,
        })
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(QUESTION_SELECT);
        builder.push(" WHERE TRUE");

        if let Some(creator_user_id) = filter.creator_user_id {
            builder.push(" AND q.creator_user_id = ");
            builder.push_bind(creator_user_id);
        }

        if let Some(subject_id) = filter.subject_id {
            builder.push(" AND q.subject_id = ");
            builder.push_bind(subject_id);
        }

        if let Some(status_id) = filter.status_id {
            builder.push(" AND q.status_id = ");
            builder.push_bind(status_id);
        }

        builder.push(" ORDER BY q.id");

        let rows: Vec<QuestionRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list questions: {:?}", e);
                AppError::from(e)
            })?;

        into_questions(rows)
    }

    async fn get_question(&self, id: i64) -> Result<Question, AppError> {
        let sql = format!("{} WHERE q.id = $1", QUESTION_SELECT);
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        row.try_into()
    }

    async fn question_types(&self) -> Result<Vec<QuestionType>, AppError> {
        let types = sqlx::query_as::<_, QuestionType>(
            "SELECT id, name FROM question_type ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    async fn question_statuses(&self) -> Result<Vec<QuestionStatusEntry>, AppError> {
        let statuses = sqlx::query_as::<_, QuestionStatusEntry>(
            "SELECT id, name FROM question_status ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(statuses)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<i64, AppError> {
        let NewQuestion {
            content,
            creator_user_id,
            moderation,
        } = question;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO question (
                text, code, variants, answer, type_id, status_id, subject_id,
                creator_user_id, moderator_user_id, moderated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(content.text)
        .bind(content.code)
        .bind(Json(content.variants.into_inner()))
        .bind(Json(content.answer.into_inner()))
        .bind(content.type_id)
        .bind(moderation.status.id())
        .bind(content.subject_id)
        .bind(creator_user_id)
        .bind(moderation.moderator_user_id)
        .bind(moderation.moderated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

        Ok(id)
    }

    async fn update_question(&self, id: i64, update: QuestionUpdate) -> Result<(), AppError> {
        let QuestionUpdate {
            content,
            moderation,
        } = update;

        let result = sqlx::query(
            r#"
            UPDATE question
            SET
                text = $1,
                code = $2,
                variants = $3,
                answer = $4,
                type_id = $5,
                subject_id = $6,
                status_id = $7,
                moderator_user_id = $8,
                moderated_at = $9
            WHERE id = $10
            "#,
        )
        .bind(content.text)
        .bind(content.code)
        .bind(Json(content.variants.into_inner()))
        .bind(Json(content.answer.into_inner()))
        .bind(content.type_id)
        .bind(content.subject_id)
        .bind(moderation.status.id())
        .bind(moderation.moderator_user_id)
        .bind(moderation.moderated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        Ok(())
    }

    async fn update_question_status(
        &self,
        id: i64,
        status: QuestionStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE question SET status_id = $1 WHERE id = $2")
            .bind(status.id())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        Ok(())
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM question WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn list_quizzes(&self, filter: QuizFilter) -> Result<Vec<Quiz>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(QUIZ_SELECT);

        if let Some(creator_user_id) = filter.creator_user_id {
            builder.push(" WHERE z.creator_user_id = ");
            builder.push_bind(creator_user_id);
        }

        builder.push(" ORDER BY z.id");

        let quizzes = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(quizzes)
    }

    async fn questions_by_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "{} JOIN quizzes_questions qq ON qq.question_id = q.id WHERE qq.quiz_id = $1 ORDER BY q.id",
            QUESTION_SELECT
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?;

        into_questions(rows)
    }

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError> {
        let sql = format!("{} WHERE z.id = $1", QUIZ_SELECT);
        let quiz = sqlx::query_as::<_, Quiz>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

        Ok(quiz)
    }

    async fn create_quiz(&self, quiz: NewQuiz, creator_user_id: i64) -> Result<i64, AppError> {
        let mut tx = begin(&self.pool, false).await?;

        let quiz_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO quiz (name, description, creator_user_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&quiz.name)
        .bind(&quiz.description)
        .bind(creator_user_id)
        .fetch_one(&mut *tx)
        .await?;

        if !quiz.question_ids.is_empty() {
            // Missing or repeated ids produce fewer rows than requested.
            let linked = sqlx::query(
                r#"
                INSERT INTO quizzes_questions (quiz_id, question_id)
                SELECT $1, q.id FROM question q WHERE q.id = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(quiz_id)
            .bind(&quiz.question_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if linked != quiz.question_ids.len() as u64 {
                tracing::error!(quiz_id, linked, "Quiz question links incomplete, rolling back");
                return Err(link_mismatch(quiz.question_ids.len(), linked));
            }
        }

        tx.commit().await?;
        Ok(quiz_id)
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), AppError> {
        let mut tx = begin(&self.pool, false).await?;

        sqlx::query("DELETE FROM quizzes_questions WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM quiz WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
