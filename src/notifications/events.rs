//! Notification events
//!
//! Defines the events published on the in-process bus after ledger changes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::UploadSummary;

/// Event types for notifications
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A CSV document was ingested
    UploadProcessed(UploadProcessedEvent),
    /// The latest upload batch was deleted
    BatchCleared(BatchClearedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::UploadProcessed(_) => "upload_processed",
            Event::BatchCleared(_) => "batch_cleared",
        }
    }

    /// Batch date the event refers to
    pub fn batch_date(&self) -> NaiveDate {
        match self {
            Event::UploadProcessed(e) => e.summary.batch_date,
            Event::BatchCleared(e) => e.batch_date,
        }
    }
}

/// Where an upload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSource {
    Web,
    Telegram,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadProcessedEvent {
    pub summary: UploadSummary,
    pub source: UploadSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchClearedEvent {
    pub batch_date: NaiveDate,
    pub rows: u64,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
