//! Schedule submission and shift-exchange coordination.
//!
//! The modules here own the rules around monthly availability saves, the
//! lifecycle of peer shift-exchange requests, and the event-driven fan-out
//! of notifications those state changes trigger. Storage, identity, and
//! delivery transports stay behind the traits in [`repository`] so the
//! engine can run against anything from a test double to a real database.

pub mod deadline;
pub mod dispatch;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use deadline::{evaluate, WindowState, WINDOW_LAST_DAY};
pub use dispatch::{
    audience_for, payload_for, Audience, DispatchOutcome, NotificationDispatcher,
};
pub use domain::{
    Announcement, AvailabilitySubmission, DomainEvent, ExchangeDecision, ExchangeId,
    ExchangeRequest, ExchangeStatus, MonthKey, MonthKeyError, PublishedSchedule, Role, ShiftSlot,
    User, UserPermissions,
};
pub use ledger::{LedgerError, SubmissionLedger, EDIT_LIMIT};
pub use lifecycle::{ExchangeError, ExchangeLifecycle};
pub use repository::{
    BulletinStore, ChannelError, Directory, ExchangeStore, NotificationChannel,
    NotificationPayload, StoreError, SubmissionStore,
};
pub use router::coordination_router;
pub use service::{CoordinationError, CoordinationService};
