use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::request::Requester;

use super::errors::NotifyError;

/// How a job ended, from the requester's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Completed { bucket: String, object: String },
    Failed { reason: String },
}

/// One message to one requester about one finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub requester: Requester,
    pub files: Vec<String>,
    #[serde(flatten)]
    pub outcome: NotificationOutcome,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
