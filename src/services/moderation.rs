// src/services/moderation.rs

//! Moderation Engine.
//!
//! Decides the status of a question whenever it is submitted or edited and
//! applies explicit approve/decline decisions. Submissions by privileged
//! roles are approved on the spot; everything else waits in the queue and
//! the moderators are told about it.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        question::{InputQuestion, ModerationOutcome, NewQuestion, QuestionStatus, QuestionUpdate},
        user::{ActingUser, Role},
    },
    notifier::{EVENT_QUESTION_ADDED, Notifier, role_room},
    store::Store,
};

/// Roles told about every question waiting for moderation.
const MODERATION_ROOMS: [Role; 2] = [Role::Admin, Role::Moderator];

/// Maps the acting user onto the moderation fields of a submission.
///
/// | role              | status   | moderator | moderated_at |
/// |-------------------|----------|-----------|--------------|
/// | Admin, Moderator  | Approved | actor id  | `now`        |
/// | Creator           | Created  | none      | none         |
pub fn decide_moderation_outcome(actor: &ActingUser, now: DateTime<Utc>) -> ModerationOutcome {
    if actor.role.is_privileged() {
        ModerationOutcome {
            status: QuestionStatus::Approved,
            moderator_user_id: Some(actor.id),
            moderated_at: Some(now),
        }
    } else {
        ModerationOutcome {
            status: QuestionStatus::Created,
            moderator_user_id: None,
            moderated_at: None,
        }
    }
}

/// Status written by an explicit moderation decision.
pub fn decision_status(approve: bool) -> QuestionStatus {
    if approve {
        QuestionStatus::Approved
    } else {
        QuestionStatus::Declined
    }
}

/// Stores a new question authored by `actor` and returns its id.
///
/// When the question lands in the queue, every moderation room is notified.
/// A failed dispatch fails the call even though the question is already
/// stored.
pub async fn submit_question(
    store: &dyn Store,
    notifier: &dyn Notifier,
    actor: &ActingUser,
    content: InputQuestion,
) -> Result<i64, AppError> {
    let moderation = decide_moderation_outcome(actor, Utc::now());
    let status = moderation.status;

    let id = store
        .create_question(NewQuestion {
            content,
            creator_user_id: actor.id,
            moderation,
        })
        .await?;

    tracing::info!(
        question_id = id,
        user_id = actor.id,
        role = %actor.role,
        status = status.name(),
        "Question submitted"
    );

    if status == QuestionStatus::Created {
        let data = json!({ "question_id": id.to_string() }).to_string();
        for role in MODERATION_ROOMS {
            let room = role_room(role);
            notifier
                .notify(&room, EVENT_QUESTION_ADDED, &data)
                .await
                .map_err(|e| {
                    tracing::error!(question_id = id, room = %room, "Failed to dispatch notification: {}", e);
                    e
                })?;
            tracing::debug!(question_id = id, room = %room, "Notification dispatched");
        }
    }

    Ok(id)
}

/// Rewrites a question and re-applies the moderation rule for `actor`.
/// The original creator is kept.
pub async fn edit_question(
    store: &dyn Store,
    actor: &ActingUser,
    id: i64,
    content: InputQuestion,
) -> Result<(), AppError> {
    let moderation = decide_moderation_outcome(actor, Utc::now());
    let status = moderation.status;

    store
        .update_question(id, QuestionUpdate { content, moderation })
        .await?;

    tracing::info!(
        question_id = id,
        user_id = actor.id,
        role = %actor.role,
        status = status.name(),
        "Question edited"
    );
    Ok(())
}

/// Overwrites the status whatever it was before.
pub async fn moderate_question(
    store: &dyn Store,
    actor: &ActingUser,
    id: i64,
    approve: bool,
) -> Result<(), AppError> {
    let status = decision_status(approve);
    store.update_question_status(id, status).await?;

    tracing::info!(
        question_id = id,
        user_id = actor.id,
        status = status.name(),
        "Question moderated"
    );
    Ok(())
}

pub async fn delete_question(store: &dyn Store, actor: &ActingUser, id: i64) -> Result<(), AppError> {
    store.delete_question(id).await?;
    tracing::info!(question_id = id, user_id = actor.id, "Question deleted");
    Ok(())
}
