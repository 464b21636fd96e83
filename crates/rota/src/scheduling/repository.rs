use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Announcement, AvailabilitySubmission, ExchangeId, ExchangeRequest, ExchangeStatus, MonthKey,
    PublishedSchedule, User,
};

/// Storage seam for monthly availability records. Each `(email, month)`
/// pair owns exactly one row; the engine reads fresh per operation and
/// keeps no in-process copy between requests.
pub trait SubmissionStore: Send + Sync {
    fn insert(
        &self,
        record: AvailabilitySubmission,
    ) -> Result<AvailabilitySubmission, StoreError>;
    fn update(&self, record: AvailabilitySubmission) -> Result<(), StoreError>;
    fn fetch(
        &self,
        email: &str,
        month: MonthKey,
    ) -> Result<Option<AvailabilitySubmission>, StoreError>;
    /// All months this member ever submitted for, for audit/history views.
    fn history(&self, email: &str) -> Result<Vec<AvailabilitySubmission>, StoreError>;
}

/// Storage seam for exchange requests.
pub trait ExchangeStore: Send + Sync {
    fn insert(&self, request: ExchangeRequest) -> Result<ExchangeRequest, StoreError>;
    fn fetch(&self, id: &ExchangeId) -> Result<Option<ExchangeRequest>, StoreError>;
    /// Transition the record to `status` only while it is still pending.
    /// Implementations must make the check-and-write atomic (the SQL shape
    /// is `UPDATE ... WHERE id = ? AND status = 'pending'`); returns the
    /// updated record, or `None` when another responder won the race.
    fn resolve_if_pending(
        &self,
        id: &ExchangeId,
        status: ExchangeStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<ExchangeRequest>, StoreError>;
    /// Pending requests targeting `email`, in insertion order.
    fn pending_for(&self, email: &str) -> Result<Vec<ExchangeRequest>, StoreError>;
}

/// Read-only view of the identity store. Audience resolution queries this
/// at dispatch time rather than caching role sets.
pub trait Directory: Send + Sync {
    fn user(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn admins(&self) -> Result<Vec<User>, StoreError>;
    fn all_users(&self) -> Result<Vec<User>, StoreError>;
}

/// Storage seam for announcements and official roster releases.
pub trait BulletinStore: Send + Sync {
    fn insert_announcement(&self, announcement: Announcement) -> Result<Announcement, StoreError>;
    /// Announcements whose visibility window contains `on`.
    fn active(&self, on: NaiveDate) -> Result<Vec<Announcement>, StoreError>;
    fn record_release(
        &self,
        release: PublishedSchedule,
    ) -> Result<PublishedSchedule, StoreError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Payload handed to every delivery channel for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub require_interaction: bool,
}

/// A fire-and-forget delivery channel (browser push, chat-bot, ...). Each
/// send stands alone; a failure on one channel never blocks another.
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;
    fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), ChannelError>;
}

/// Delivery transport error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel transport unavailable: {0}")]
    Transport(String),
}
