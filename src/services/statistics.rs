// src/services/statistics.rs

use crate::{
    error::AppError,
    models::{statistic::Statistic, user::ActingUser},
    store::Store,
};

/// Builds the dashboard rollup for `actor` from one store snapshot.
///
/// Per-subject counts cover top-level subjects only, each including its
/// whole subtree. Questions without a subject appear in the global count
/// but in no subject bucket.
pub async fn get_statistic(store: &dyn Store, actor: &ActingUser) -> Result<Statistic, AppError> {
    let snapshot = store.statistic_snapshot(actor.id).await?;

    tracing::debug!(
        user_id = actor.id,
        questions = snapshot.question_count,
        pending = snapshot.question_to_moderate_count,
        "Statistic computed"
    );

    Ok(Statistic {
        tests_count: snapshot.quiz_count,
        subject_count: snapshot.subject_count,
        question_count: snapshot.question_count,
        question_to_moderate_count: snapshot.question_to_moderate_count,
        test_count_created_by_current_user: snapshot.quiz_count_by_user,
        question_count_created_by_current_user: snapshot.question_count_by_user,
        question_counts_by_subject: snapshot.by_root_subject,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        models::{
            document::Document,
            question::{InputQuestion, NewQuestion},
            quiz::NewQuiz,
            subject::NewSubject,
            user::Role,
        },
        services::moderation::decide_moderation_outcome,
        store::{MemoryStore, QuestionStore, QuizStore, SubjectStore},
    };

    fn subject(name: &str, parent_id: Option<i64>) -> NewSubject {
        NewSubject {
            name: name.to_string(),
            description: String::new(),
            active: true,
            parent_id,
        }
    }

    async fn add_question(store: &MemoryStore, actor: &ActingUser, subject_id: Option<i64>) -> i64 {
        store
            .create_question(NewQuestion {
                content: InputQuestion {
                    text: "q".to_string(),
                    code: String::new(),
                    variants: Document::default(),
                    answer: Document::default(),
                    type_id: 1,
                    subject_id,
                },
                creator_user_id: actor.id,
                moderation: decide_moderation_outcome(actor, Utc::now()),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_store_yields_zeroes() {
        let store = MemoryStore::new();
        let stat = get_statistic(&store, &ActingUser::new(1, Role::Admin))
            .await
            .unwrap();
        assert_eq!(stat.tests_count, 0);
        assert_eq!(stat.question_count, 0);
        assert!(stat.question_counts_by_subject.is_empty());
    }

    #[tokio::test]
    async fn nested_question_counts_towards_its_root() {
        let store = MemoryStore::new();
        let creator = ActingUser::new(8, Role::Creator);

        let math = store.create_subject(subject("Math", None), 1).await.unwrap();
        let algebra = store
            .create_subject(subject("Algebra", Some(math)), 1)
            .await
            .unwrap();
        add_question(&store, &creator, Some(algebra)).await;

        let stat = get_statistic(&store, &creator).await.unwrap();
        assert_eq!(stat.subject_count, 2);
        assert_eq!(stat.question_counts_by_subject.len(), 1);
        let math_bucket = &stat.question_counts_by_subject[0];
        assert_eq!(math_bucket.subject_id, math);
        assert_eq!(math_bucket.subject_name, "Math");
        assert_eq!(math_bucket.question_count, 1);
    }

    #[tokio::test]
    async fn rollup_splits_global_and_per_user_counts() {
        let store = MemoryStore::new();
        let creator = ActingUser::new(8, Role::Creator);
        let moderator = ActingUser::new(3, Role::Moderator);

        let math = store.create_subject(subject("Math", None), 1).await.unwrap();
        let physics = store.create_subject(subject("Physics", None), 1).await.unwrap();

        let q1 = add_question(&store, &creator, Some(math)).await;
        add_question(&store, &creator, None).await;
        let q3 = add_question(&store, &moderator, Some(physics)).await;
        add_question(&store, &moderator, Some(physics)).await;

        store
            .create_quiz(
                NewQuiz {
                    name: "Mixed".to_string(),
                    description: String::new(),
                    question_ids: vec![q1, q3],
                },
                creator.id,
            )
            .await
            .unwrap();

        let stat = get_statistic(&store, &creator).await.unwrap();
        assert_eq!(stat.tests_count, 1);
        assert_eq!(stat.subject_count, 2);
        assert_eq!(stat.question_count, 4);
        assert_eq!(stat.question_to_moderate_count, 2);
        assert_eq!(stat.test_count_created_by_current_user, 1);
        assert_eq!(stat.question_count_created_by_current_user, 2);

        // The subject-less question is left out of every bucket.
        let buckets: Vec<(i64, i64)> = stat
            .question_counts_by_subject
            .iter()
            .map(|b| (b.subject_id, b.question_count))
            .collect();
        assert_eq!(buckets, vec![(math, 1), (physics, 2)]);
        let bucketed: i64 = buckets.iter().map(|(_, n)| n).sum();
        assert!(bucketed < stat.question_count);

        let stat = get_statistic(&store, &moderator).await.unwrap();
        assert_eq!(stat.test_count_created_by_current_user, 0);
        assert_eq!(stat.question_count_created_by_current_user, 2);
    }
}
