// src/notifier.rs

//! Notification Dispatcher: fire-and-forget delivery of events to rooms.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{error::AppError, models::user::Role};

/// Event announcing a question waiting for moderation.
pub const EVENT_QUESTION_ADDED: &str = "AddQuestion";

/// Addressing string of the room every user with `role` listens on.
pub fn role_room(role: Role) -> String {
    format!("role:{}", role)
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one event at most once. No retry.
    async fn notify(&self, room: &str, event: &str, data: &str) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct NotificationMessage<'a> {
    room: &'a str,
    event: &'a str,
    data: &'a str,
}

/// Posts notifications as JSON to an external notification service.
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, room: &str, event: &str, data: &str) -> Result<(), AppError> {
        let message = NotificationMessage { room, event, data };

        self.client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to reach notification service for {} {}: {}",
                    event,
                    room,
                    e
                );
                AppError::from(e)
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Notification service rejected {} for {}: {}", event, room, e);
                AppError::from(e)
            })?;

        Ok(())
    }
}

/// Records notifications in the log only. Used when no service is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, room: &str, event: &str, data: &str) -> Result<(), AppError> {
        tracing::info!(room, event, data, "Notification");
        Ok(())
    }
}
