use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use super::deadline::{self, WindowState};
use super::dispatch::{DispatchOutcome, NotificationDispatcher};
use super::domain::{
    Announcement, AvailabilitySubmission, DomainEvent, ExchangeDecision, ExchangeId,
    ExchangeRequest, MonthKey, PublishedSchedule, ShiftSlot, User,
};
use super::ledger::{LedgerError, SubmissionLedger};
use super::lifecycle::{ExchangeError, ExchangeLifecycle};
use super::repository::{
    BulletinStore, Directory, ExchangeStore, NotificationChannel, StoreError, SubmissionStore,
};

/// Entry points the presentation layer calls. Every mutating operation is
/// sequenced mutation-first: the domain write commits, then the dispatcher
/// fans out, and the domain result is returned whatever the fan-out did.
pub struct CoordinationService<S, X, D, B> {
    ledger: SubmissionLedger<S>,
    lifecycle: ExchangeLifecycle<X>,
    dispatcher: NotificationDispatcher<D>,
    directory: Arc<D>,
    bulletins: Arc<B>,
}

impl<S, X, D, B> CoordinationService<S, X, D, B>
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    pub fn new(
        submissions: Arc<S>,
        exchanges: Arc<X>,
        directory: Arc<D>,
        bulletins: Arc<B>,
        channels: Vec<Arc<dyn NotificationChannel>>,
    ) -> Self {
        Self {
            ledger: SubmissionLedger::new(submissions),
            lifecycle: ExchangeLifecycle::new(exchanges),
            dispatcher: NotificationDispatcher::new(directory.clone(), channels),
            directory,
            bulletins,
        }
    }

    /// Save a member's availability for a month. An empty selection is
    /// rejected here before the ledger is consulted.
    pub fn submit_availability(
        &self,
        email: &str,
        month: MonthKey,
        dates: Vec<NaiveDate>,
        overnights: Vec<NaiveDate>,
        today: NaiveDate,
    ) -> Result<AvailabilitySubmission, CoordinationError> {
        if dates.is_empty() && overnights.is_empty() {
            return Err(CoordinationError::EmptySelection);
        }
        let user = self.member(email)?;
        let (record, event) = self
            .ledger
            .submit(&user, month, dates, overnights, today, Utc::now())?;
        self.fan_out(&event);
        Ok(record)
    }

    /// Window state for one member on one day, for the availability form.
    pub fn submission_window(
        &self,
        email: &str,
        today: NaiveDate,
    ) -> Result<WindowState, CoordinationError> {
        let user = self.member(email)?;
        Ok(deadline::evaluate(
            today,
            user.permissions.allow_late_submission,
        ))
    }

    /// Every availability record this member ever saved, newest month last.
    pub fn submission_history(
        &self,
        email: &str,
    ) -> Result<Vec<AvailabilitySubmission>, CoordinationError> {
        Ok(self.ledger.history(email)?)
    }

    /// Propose taking over one of `target_email`'s shifts.
    pub fn propose_exchange(
        &self,
        requester_email: &str,
        target_email: &str,
        date: NaiveDate,
        shift: ShiftSlot,
    ) -> Result<ExchangeRequest, CoordinationError> {
        let requester = self.member(requester_email)?;
        let target = self.member(target_email)?;
        let (request, event) = self
            .lifecycle
            .propose(&requester, &target, date, shift, Utc::now())?;
        self.fan_out(&event);
        Ok(request)
    }

    /// Accept or reject a pending exchange. The presentation layer only
    /// offers a request to its target holder; that context is the guard,
    /// the lifecycle does not re-check responder identity.
    pub fn respond_to_exchange(
        &self,
        id: &ExchangeId,
        responder_email: &str,
        decision: ExchangeDecision,
    ) -> Result<ExchangeRequest, CoordinationError> {
        let responder = self.member(responder_email)?;
        let (request, event) = self
            .lifecycle
            .respond(id, &responder, decision, Utc::now())?;
        self.fan_out(&event);
        Ok(request)
    }

    /// Pending requests targeting this member; gates the login interstitial.
    pub fn pending_exchanges(
        &self,
        email: &str,
    ) -> Result<Vec<ExchangeRequest>, CoordinationError> {
        Ok(self.lifecycle.pending_for(email)?)
    }

    /// Record the official roster release for a month and tell everyone.
    pub fn publish_schedule(
        &self,
        month: MonthKey,
    ) -> Result<PublishedSchedule, CoordinationError> {
        let release = self.bulletins.record_release(PublishedSchedule {
            month,
            released_at: Utc::now(),
        })?;
        self.fan_out(&DomainEvent::SchedulePublished { month });
        Ok(release)
    }

    /// Store an announcement and tell everyone. The visibility window must
    /// be well-formed before anything is written.
    pub fn publish_announcement(
        &self,
        announcement: Announcement,
    ) -> Result<Announcement, CoordinationError> {
        if announcement.end_date < announcement.start_date {
            return Err(CoordinationError::InvalidAnnouncementWindow);
        }
        let stored = self.bulletins.insert_announcement(announcement)?;
        self.fan_out(&DomainEvent::AnnouncementCreated {
            title: stored.title.clone(),
        });
        Ok(stored)
    }

    /// Announcements whose window contains `today`.
    pub fn active_announcements(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Announcement>, CoordinationError> {
        Ok(self.bulletins.active(today)?)
    }

    /// Driven by an external interval tick. Reminds everyone while the
    /// window is open; does nothing once it has closed.
    pub fn send_deadline_reminder(&self, today: NaiveDate) -> Option<DispatchOutcome> {
        match deadline::evaluate(today, false) {
            WindowState::Open { days_remaining } => {
                Some(self.fan_out(&DomainEvent::DeadlineReminder { days_remaining }))
            }
            WindowState::OpenOverride | WindowState::Closed => None,
        }
    }

    fn member(&self, email: &str) -> Result<User, CoordinationError> {
        self.directory
            .user(email)?
            .ok_or_else(|| CoordinationError::UnknownUser(email.to_string()))
    }

    /// Best-effort side channel: the mutation this event came from has
    /// already committed, so delivery problems are logged and kept out of
    /// the caller's result.
    fn fan_out(&self, event: &DomainEvent) -> DispatchOutcome {
        let outcome = self.dispatcher.dispatch(event);
        if !outcome.success {
            warn!(
                sent = outcome.sent,
                detail = outcome.message.as_deref().unwrap_or_default(),
                "notification fan-out completed with failures"
            );
        }
        outcome
    }
}

/// Error raised by the coordination facade.
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("select at least one shift date before submitting")]
    EmptySelection,
    #[error("announcement end date precedes its start date")]
    InvalidAnnouncementWindow,
    #[error("no roster member with email {0}")]
    UnknownUser(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
