// src/store/memory.rs

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        document::Document,
        question::{
            InputQuestion, ModerationOutcome, NewQuestion, Question, QuestionFilter,
            QuestionStatus, QuestionStatusEntry, QuestionType, QuestionUpdate,
        },
        quiz::{NewQuiz, Quiz, QuizFilter},
        statistic::{StatisticSnapshot, SubjectStatisticItem},
        subject::{NewSubject, Subject, UpdateSubject},
    },
    store::{QuestionStore, QuizStore, SubjectStore, link_mismatch, path::SubjectPath},
};

struct SubjectRow {
    id: i64,
    name: String,
    description: String,
    creator_user_id: i64,
    active: bool,
    parent_id: Option<i64>,
    path: SubjectPath,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct QuestionRow {
    id: i64,
    text: String,
    code: String,
    variants: Document,
    answer: Document,
    type_id: i64,
    status: QuestionStatus,
    subject_id: Option<i64>,
    creator_user_id: i64,
    moderator_user_id: Option<i64>,
    moderated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

struct QuizRow {
    id: i64,
    name: String,
    description: String,
    creator_user_id: i64,
    question_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Sequences {
    subject: i64,
    question: i64,
    quiz: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

struct Tables {
    subjects: BTreeMap<i64, SubjectRow>,
    questions: BTreeMap<i64, QuestionRow>,
    quizzes: BTreeMap<i64, QuizRow>,
    types: Vec<QuestionType>,
    seq: Sequences,
}

/// In-process store with the same semantics as the Postgres schema.
///
/// A single lock guards all tables, so every operation (including the
/// statistics rollup) observes one consistent state.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the same question types the migrations seed.
    pub fn new() -> Self {
        let types = [(1, "Test"), (2, "Comparison"), (3, "Text")]
            .into_iter()
            .map(|(id, name)| QuestionType {
                id,
                name: name.to_string(),
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                subjects: BTreeMap::new(),
                questions: BTreeMap::new(),
                quizzes: BTreeMap::new(),
                types,
                seq: Sequences::default(),
            }),
        }
    }
}

impl Tables {
    fn check_question_refs(&self, content: &InputQuestion) -> Result<(), AppError> {
        if !self.types.iter().any(|t| t.id == content.type_id) {
            return Err(AppError::Validation(format!(
                "Question type {} does not exist",
                content.type_id
            )));
        }
        if let Some(subject_id) = content.subject_id {
            if !self.subjects.contains_key(&subject_id) {
                return Err(AppError::Validation(format!(
                    "Subject {} does not exist",
                    subject_id
                )));
            }
        }
        Ok(())
    }

    fn check_subject_name(&self, name: &str, except: Option<i64>) -> Result<(), AppError> {
        let taken = self
            .subjects
            .values()
            .any(|s| s.name == name && Some(s.id) != except);
        if taken {
            return Err(AppError::AlreadyExists(format!(
                "Subject '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn parent_path(&self, parent_id: i64) -> Result<SubjectPath, AppError> {
        self.subjects
            .get(&parent_id)
            .map(|p| p.path.clone())
            .ok_or_else(|| {
                AppError::Validation(format!("Parent subject {} does not exist", parent_id))
            })
    }

    fn to_question(&self, row: &QuestionRow) -> Question {
        let question_type = self
            .types
            .iter()
            .find(|t| t.id == row.type_id)
            .cloned()
            .unwrap_or_else(|| QuestionType {
                id: row.type_id,
                name: String::new(),
            });
        let subject_name = row
            .subject_id
            .and_then(|id| self.subjects.get(&id))
            .map(|s| s.name.clone());

        Question {
            id: row.id,
            text: row.text.clone(),
            code: row.code.clone(),
            variants: row.variants.clone(),
            answer: row.answer.clone(),
            question_type,
            status: row.status,
            subject_id: row.subject_id,
            subject_name,
            creator_user_id: row.creator_user_id,
            moderator_user_id: row.moderator_user_id,
            moderated_at: row.moderated_at,
            created_at: row.created_at,
        }
    }

    fn to_quiz(row: &QuizRow) -> Quiz {
        Quiz {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            creator_user_id: row.creator_user_id,
            question_ids: row.question_ids.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn apply_content(row: &mut QuestionRow, content: InputQuestion, moderation: ModerationOutcome) {
    row.text = content.text;
    row.code = content.code;
    row.variants = content.variants;
    row.answer = content.answer;
    row.type_id = content.type_id;
    row.subject_id = content.subject_id;
    row.status = moderation.status;
    row.moderator_user_id = moderation.moderator_user_id;
    row.moderated_at = moderation.moderated_at;
}

#[async_trait]
impl SubjectStore for MemoryStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<&SubjectRow> = tables.subjects.values().collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));

        let subjects = rows
            .into_iter()
            .map(|s| {
                let direct = tables
                    .questions
                    .values()
                    .filter(|q| q.subject_id == Some(s.id));
                let (total, approved) = direct.fold((0, 0), |(total, approved), q| {
                    let is_approved = q.status == QuestionStatus::Approved;
                    (total + 1, approved + i64::from(is_approved))
                });
                Subject {
                    id: s.id,
                    name: s.name.clone(),
                    description: s.description.clone(),
                    creator_user_id: s.creator_user_id,
                    active: s.active,
                    parent_id: s.parent_id,
                    created_at: s.created_at,
                    updated_at: s.updated_at,
                    question_count: total,
                    approved_question_count: approved,
                }
            })
            .collect();

        Ok(subjects)
    }

    async fn create_subject(
        &self,
        subject: NewSubject,
        creator_user_id: i64,
    ) -> Result<i64, AppError> {
        let mut tables = self.tables.write().await;

        tables.check_subject_name(&subject.name, None)?;
        let parent_path = subject
            .parent_id
            .map(|parent_id| tables.parent_path(parent_id))
            .transpose()?;

        let id = next(&mut tables.seq.subject);
        let path = match parent_path {
            Some(parent) => parent.child(id),
            None => SubjectPath::root(id),
        };
        let now = Utc::now();
        tables.subjects.insert(
            id,
            SubjectRow {
                id,
                name: subject.name,
                description: subject.description,
                creator_user_id,
                active: subject.active,
                parent_id: subject.parent_id,
                path,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update_subject(&self, subject: UpdateSubject) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        let old_path = tables
            .subjects
            .get(&subject.id)
            .map(|s| s.path.clone())
            .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
        tables.check_subject_name(&subject.name, Some(subject.id))?;

        let new_path = match subject.parent_id {
            Some(parent_id) => {
                let parent = tables.parent_path(parent_id)?;
                if parent.is_descendant_of(&old_path) {
                    return Err(AppError::Validation(
                        "Subject cannot be moved under itself".to_string(),
                    ));
                }
                parent.child(subject.id)
            }
            None => SubjectPath::root(subject.id),
        };

        if new_path != old_path {
            for row in tables.subjects.values_mut() {
                if let Some(moved) = row.path.rebase(&old_path, &new_path) {
                    row.path = moved;
                }
            }
        }

        if let Some(row) = tables.subjects.get_mut(&subject.id) {
            row.name = subject.name;
            row.description = subject.description;
            row.active = subject.active;
            row.parent_id = subject.parent_id;
            row.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn delete_subject(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        let root = tables
            .subjects
            .get(&id)
            .map(|s| s.path.clone())
            .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;

        let removed: BTreeSet<i64> = tables
            .subjects
            .values()
            .filter(|s| s.path.is_descendant_of(&root))
            .map(|s| s.id)
            .collect();

        tables.subjects.retain(|id, _| !removed.contains(id));
        for question in tables.questions.values_mut() {
            if question.subject_id.is_some_and(|s| removed.contains(&s)) {
                question.subject_id = None;
            }
        }

        Ok(())
    }

    async fn statistic_snapshot(&self, user_id: i64) -> Result<StatisticSnapshot, AppError> {
        let tables = self.tables.read().await;

        let count = |n: usize| n as i64;

        let mut roots: Vec<&SubjectRow> = tables
            .subjects
            .values()
            .filter(|s| s.parent_id.is_none())
            .collect();
        roots.sort_by(|a, b| a.path.cmp(&b.path));

        let by_root_subject = roots
            .into_iter()
            .map(|root| {
                let question_count = tables
                    .questions
                    .values()
                    .filter_map(|q| q.subject_id)
                    .filter_map(|subject_id| tables.subjects.get(&subject_id))
                    .filter(|member| member.path.is_descendant_of(&root.path))
                    .count();
                SubjectStatisticItem {
                    subject_id: root.id,
                    subject_name: root.name.clone(),
                    question_count: count(question_count),
                }
            })
            .collect();

        Ok(StatisticSnapshot {
            quiz_count: count(tables.quizzes.len()),
            subject_count: count(tables.subjects.len()),
            question_count: count(tables.questions.len()),
            question_to_moderate_count: count(
                tables
                    .questions
                    .values()
                    .filter(|q| q.status == QuestionStatus::Created)
                    .count(),
            ),
            quiz_count_by_user: count(
                tables
                    .quizzes
                    .values()
                    .filter(|q| q.creator_user_id == user_id)
                    .count(),
            ),
            question_count_by_user: count(
                tables
                    .questions
                    .values()
                    .filter(|q| q.creator_user_id == user_id)
                    .count(),
            ),
            by_root_subject,
        })
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn list_questions(&self, filter: QuestionFilter) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;

        let questions = tables
            .questions
            .values()
            .filter(|q| filter.creator_user_id.is_none_or(|c| q.creator_user_id == c))
            .filter(|q| filter.subject_id.is_none_or(|s| q.subject_id == Some(s)))
            .filter(|q| filter.status_id.is_none_or(|s| q.status.id() == s))
            .map(|q| tables.to_question(q))
            .collect();

        Ok(questions)
    }

    async fn get_question(&self, id: i64) -> Result<Question, AppError> {
        let tables = self.tables.read().await;
        tables
            .questions
            .get(&id)
            .map(|q| tables.to_question(q))
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    async fn question_types(&self) -> Result<Vec<QuestionType>, AppError> {
        Ok(self.tables.read().await.types.clone())
    }

    async fn question_statuses(&self) -> Result<Vec<QuestionStatusEntry>, AppError> {
        Ok(QuestionStatus::ALL.into_iter().map(Into::into).collect())
    }

    async fn create_question(&self, question: NewQuestion) -> Result<i64, AppError> {
        let mut tables = self.tables.write().await;

        tables.check_question_refs(&question.content)?;

        let id = next(&mut tables.seq.question);
        let NewQuestion {
            content,
            creator_user_id,
            moderation,
        } = question;
        let row = QuestionRow {
            id,
            text: content.text,
            code: content.code,
            variants: content.variants,
            answer: content.answer,
            type_id: content.type_id,
            status: moderation.status,
            subject_id: content.subject_id,
            creator_user_id,
            moderator_user_id: moderation.moderator_user_id,
            moderated_at: moderation.moderated_at,
            created_at: Utc::now(),
        };
        tables.questions.insert(id, row);

        Ok(id)
    }

    async fn update_question(&self, id: i64, update: QuestionUpdate) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if !tables.questions.contains_key(&id) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        tables.check_question_refs(&update.content)?;

        if let Some(row) = tables.questions.get_mut(&id) {
            apply_content(row, update.content, update.moderation);
        }
        Ok(())
    }

    async fn update_question_status(
        &self,
        id: i64,
        status: QuestionStatus,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .questions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        row.status = status;
        Ok(())
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if tables.questions.remove(&id).is_none() {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        for quiz in tables.quizzes.values_mut() {
            quiz.question_ids.retain(|q| *q != id);
        }
        Ok(())
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn list_quizzes(&self, filter: QuizFilter) -> Result<Vec<Quiz>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .quizzes
            .values()
            .filter(|q| filter.creator_user_id.is_none_or(|c| q.creator_user_id == c))
            .map(Tables::to_quiz)
            .collect())
    }

    async fn questions_by_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        let Some(quiz) = tables.quizzes.get(&quiz_id) else {
            return Ok(Vec::new());
        };
        Ok(quiz
            .question_ids
            .iter()
            .filter_map(|id| tables.questions.get(id))
            .map(|q| tables.to_question(q))
            .collect())
    }

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError> {
        let tables = self.tables.read().await;
        tables
            .quizzes
            .get(&id)
            .map(Tables::to_quiz)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    async fn create_quiz(&self, quiz: NewQuiz, creator_user_id: i64) -> Result<i64, AppError> {
        let mut tables = self.tables.write().await;

        // Same rule as the SQL insert: each existing question links once.
        let mut seen = BTreeSet::new();
        let mut linked: Vec<i64> = quiz
            .question_ids
            .iter()
            .copied()
            .filter(|id| tables.questions.contains_key(id) && seen.insert(*id))
            .collect();
        if linked.len() != quiz.question_ids.len() {
            return Err(link_mismatch(quiz.question_ids.len(), linked.len() as u64));
        }
        linked.sort_unstable();

        let id = next(&mut tables.seq.quiz);
        let now = Utc::now();
        tables.quizzes.insert(
            id,
            QuizRow {
                id,
                name: quiz.name,
                description: quiz.description,
                creator_user_id,
                question_ids: linked,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.quizzes.remove(&id).is_none() {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(())
    }
}
