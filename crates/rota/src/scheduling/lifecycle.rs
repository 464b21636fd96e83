use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    DomainEvent, ExchangeDecision, ExchangeId, ExchangeRequest, ExchangeStatus, ShiftSlot, User,
};
use super::repository::{ExchangeStore, StoreError};

static EXCHANGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_exchange_id() -> ExchangeId {
    let id = EXCHANGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ExchangeId(format!("xchg-{id:06}"))
}

/// Owns the state machine for shift-exchange requests: `Pending` resolves
/// exactly once to `Accepted` or `Rejected` and stays terminal.
pub struct ExchangeLifecycle<S> {
    store: Arc<S>,
}

impl<S> ExchangeLifecycle<S>
where
    S: ExchangeStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a new pending request from `requester` to `target`.
    ///
    /// Duplicate pending proposals for the same slot are not rejected here;
    /// the historical behavior allows them and the roster owners have not
    /// settled a dedup policy yet.
    pub fn propose(
        &self,
        requester: &User,
        target: &User,
        date: NaiveDate,
        shift: ShiftSlot,
        now: DateTime<Utc>,
    ) -> Result<(ExchangeRequest, DomainEvent), ExchangeError> {
        if requester.email == target.email {
            return Err(ExchangeError::SelfExchange);
        }

        let request = self.store.insert(ExchangeRequest {
            id: next_exchange_id(),
            requester_email: requester.email.clone(),
            target_email: target.email.clone(),
            date,
            shift,
            status: ExchangeStatus::Pending,
            created_at: now,
            resolved_at: None,
        })?;

        let event = DomainEvent::ExchangeProposed {
            request: request.clone(),
        };
        Ok((request, event))
    }

    /// Resolve a pending request. `responder` must be the target holder;
    /// callers establish that from their own context, it is not re-checked
    /// here. The status write goes through the store's conditional
    /// transition so two concurrent responses cannot both land.
    pub fn respond(
        &self,
        id: &ExchangeId,
        responder: &User,
        decision: ExchangeDecision,
        now: DateTime<Utc>,
    ) -> Result<(ExchangeRequest, DomainEvent), ExchangeError> {
        let current = self.store.fetch(id)?.ok_or(ExchangeError::NotFound)?;
        if current.status.is_terminal() {
            return Err(ExchangeError::AlreadyResolved);
        }

        let resolved = self
            .store
            .resolve_if_pending(id, decision.resolves_to(), now)?
            .ok_or(ExchangeError::AlreadyResolved)?;

        let event = DomainEvent::ExchangeResolved {
            status: resolved.status,
            requester_email: resolved.requester_email.clone(),
            target_name: responder.display_name.clone(),
            date: resolved.date,
            shift: resolved.shift,
        };
        Ok((resolved, event))
    }

    /// Pending requests targeting `email`, in insertion order. The login
    /// interstitial shows these and is suppressed entirely at count zero.
    pub fn pending_for(&self, email: &str) -> Result<Vec<ExchangeRequest>, ExchangeError> {
        Ok(self.store.pending_for(email)?)
    }
}

/// Error raised by the exchange lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("a shift cannot be exchanged with yourself")]
    SelfExchange,
    #[error("exchange request not found")]
    NotFound,
    #[error("exchange request was already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Store(#[from] StoreError),
}
