use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Announcement, ExchangeDecision, ExchangeId, ExchangeRequest, MonthKey, ShiftSlot,
};
use super::ledger::LedgerError;
use super::lifecycle::ExchangeError;
use super::repository::{BulletinStore, Directory, ExchangeStore, StoreError, SubmissionStore};
use super::service::{CoordinationError, CoordinationService};

/// Router builder exposing the coordination facade over HTTP.
pub fn coordination_router<S, X, D, B>(
    service: Arc<CoordinationService<S, X, D, B>>,
) -> Router
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/availability",
            post(submit_availability_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/availability/:email/window",
            get(submission_window_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/availability/:email/history",
            get(submission_history_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/exchanges",
            post(propose_exchange_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/exchanges/:id/response",
            post(respond_exchange_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/exchanges/pending/:email",
            get(pending_exchanges_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/schedule/releases",
            post(publish_schedule_handler::<S, X, D, B>),
        )
        .route(
            "/api/v1/announcements",
            post(publish_announcement_handler::<S, X, D, B>)
                .get(active_announcements_handler::<S, X, D, B>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAvailabilityRequest {
    pub(crate) email: String,
    pub(crate) month: MonthKey,
    #[serde(default)]
    pub(crate) dates: Vec<NaiveDate>,
    #[serde(default)]
    pub(crate) overnights: Vec<NaiveDate>,
    /// Evaluation date for the window check (defaults to today).
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProposeExchangeRequest {
    pub(crate) requester_email: String,
    pub(crate) target_email: String,
    pub(crate) date: NaiveDate,
    pub(crate) shift: ShiftSlot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondExchangeRequest {
    pub(crate) responder_email: String,
    pub(crate) decision: ExchangeDecision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishScheduleRequest {
    pub(crate) month: MonthKey,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DateQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

/// Pending list plus the count the interstitial gates on.
#[derive(Debug, Serialize)]
pub(crate) struct PendingExchangesView {
    pub(crate) count: usize,
    pub(crate) requests: Vec<ExchangeRequest>,
}

async fn submit_availability_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    axum::Json(request): axum::Json<SubmitAvailabilityRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    match service.submit_availability(
        &request.email,
        request.month,
        request.dates,
        request.overnights,
        today,
    ) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn submission_window_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    Path(email): Path<String>,
    Query(query): Query<DateQuery>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.submission_window(&email, today) {
        Ok(window) => (StatusCode::OK, axum::Json(window)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn submission_history_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    Path(email): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.submission_history(&email) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn propose_exchange_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    axum::Json(request): axum::Json<ProposeExchangeRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.propose_exchange(
        &request.requester_email,
        &request.target_email,
        request.date,
        request.shift,
    ) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn respond_exchange_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<RespondExchangeRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.respond_to_exchange(
        &ExchangeId(id),
        &request.responder_email,
        request.decision,
    ) {
        Ok(resolved) => (StatusCode::OK, axum::Json(resolved)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn pending_exchanges_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    Path(email): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.pending_exchanges(&email) {
        Ok(requests) => {
            let view = PendingExchangesView {
                count: requests.len(),
                requests,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn publish_schedule_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    axum::Json(request): axum::Json<PublishScheduleRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.publish_schedule(request.month) {
        Ok(release) => (StatusCode::CREATED, axum::Json(release)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn publish_announcement_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    axum::Json(announcement): axum::Json<Announcement>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    match service.publish_announcement(announcement) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn active_announcements_handler<S, X, D, B>(
    State(service): State<Arc<CoordinationService<S, X, D, B>>>,
    Query(query): Query<DateQuery>,
) -> Response
where
    S: SubmissionStore + 'static,
    X: ExchangeStore + 'static,
    D: Directory + 'static,
    B: BulletinStore + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.active_announcements(today) {
        Ok(announcements) => (StatusCode::OK, axum::Json(announcements)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Domain failures map to client statuses; infrastructure failures stay 500.
fn error_response(err: CoordinationError) -> Response {
    let status = match &err {
        CoordinationError::EmptySelection
        | CoordinationError::InvalidAnnouncementWindow
        | CoordinationError::Ledger(LedgerError::DeadlinePassed)
        | CoordinationError::Ledger(LedgerError::EditLimitExceeded { .. })
        | CoordinationError::Exchange(ExchangeError::SelfExchange) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CoordinationError::Exchange(ExchangeError::AlreadyResolved) => StatusCode::CONFLICT,
        CoordinationError::Exchange(ExchangeError::NotFound)
        | CoordinationError::UnknownUser(_) => StatusCode::NOT_FOUND,
        CoordinationError::Store(StoreError::Conflict)
        | CoordinationError::Ledger(LedgerError::Store(StoreError::Conflict))
        | CoordinationError::Exchange(ExchangeError::Store(StoreError::Conflict)) => {
            StatusCode::CONFLICT
        }
        CoordinationError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
