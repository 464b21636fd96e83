use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use super::deadline;
use super::domain::{AvailabilitySubmission, DomainEvent, MonthKey, User};
use super::repository::{StoreError, SubmissionStore};

/// Accepted saves per member per month, including the first one.
pub const EDIT_LIMIT: u8 = 2;

/// Tracks accepted availability saves per `(member, month)` and enforces
/// the submission window and the edit-count ceiling.
pub struct SubmissionLedger<S> {
    store: Arc<S>,
}

impl<S> SubmissionLedger<S>
where
    S: SubmissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Accept or reject an availability save. A first save creates the
    /// record with `edit_count = 1`; later saves overwrite the selection
    /// and increment the count up to [`EDIT_LIMIT`]. Nothing is written
    /// when the window is closed or the cap is reached.
    ///
    /// Non-emptiness of the selection is the caller's concern; the ledger
    /// only enforces the window and the cap.
    pub fn submit(
        &self,
        user: &User,
        month: MonthKey,
        dates: Vec<NaiveDate>,
        overnights: Vec<NaiveDate>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(AvailabilitySubmission, DomainEvent), LedgerError> {
        let window = deadline::evaluate(today, user.permissions.allow_late_submission);
        if !window.accepts_submissions() {
            return Err(LedgerError::DeadlinePassed);
        }

        let record = match self.store.fetch(&user.email, month)? {
            None => self.store.insert(AvailabilitySubmission {
                email: user.email.clone(),
                month,
                dates,
                overnights,
                edit_count: 1,
                submitted_at: now,
            })?,
            Some(mut existing) => {
                if existing.edit_count >= EDIT_LIMIT {
                    return Err(LedgerError::EditLimitExceeded {
                        edit_count: existing.edit_count,
                    });
                }
                existing.dates = dates;
                existing.overnights = overnights;
                existing.edit_count += 1;
                existing.submitted_at = now;
                self.store.update(existing.clone())?;
                existing
            }
        };

        let event = DomainEvent::ScheduleSubmitted {
            email: record.email.clone(),
            month,
            edit_count: record.edit_count,
        };
        Ok((record, event))
    }

    pub fn history(&self, email: &str) -> Result<Vec<AvailabilitySubmission>, LedgerError> {
        Ok(self.store.history(email)?)
    }
}

/// Error raised by the submission ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("the submission window for this month has closed")]
    DeadlinePassed,
    #[error("availability was already saved {edit_count} times this month")]
    EditLimitExceeded { edit_count: u8 },
    #[error(transparent)]
    Store(#[from] StoreError),
}
