use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use rota::scheduling::{
    Announcement, AvailabilitySubmission, BulletinStore, ChannelError, Directory, ExchangeId,
    ExchangeRequest, ExchangeStatus, ExchangeStore, MonthKey, NotificationChannel,
    NotificationPayload, PublishedSchedule, Role, StoreError, SubmissionStore, User,
    UserPermissions,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemorySubmissionStore {
    records: Mutex<HashMap<(String, MonthKey), AvailabilitySubmission>>,
}

impl SubmissionStore for InMemorySubmissionStore {
    fn insert(
        &self,
        record: AvailabilitySubmission,
    ) -> Result<AvailabilitySubmission, StoreError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        let key = (record.email.clone(), record.month);
        if guard.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn update(&self, record: AvailabilitySubmission) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        let key = (record.email.clone(), record.month);
        if !guard.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        guard.insert(key, record);
        Ok(())
    }

    fn fetch(
        &self,
        email: &str,
        month: MonthKey,
    ) -> Result<Option<AvailabilitySubmission>, StoreError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard.get(&(email.to_string(), month)).cloned())
    }

    fn history(&self, email: &str) -> Result<Vec<AvailabilitySubmission>, StoreError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| record.email == email)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.month);
        Ok(records)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryExchangeStore {
    records: Mutex<Vec<ExchangeRequest>>,
}

impl ExchangeStore for InMemoryExchangeStore {
    fn insert(&self, request: ExchangeRequest) -> Result<ExchangeRequest, StoreError> {
        self.records
            .lock()
            .expect("exchange mutex poisoned")
            .push(request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &ExchangeId) -> Result<Option<ExchangeRequest>, StoreError> {
        let guard = self.records.lock().expect("exchange mutex poisoned");
        Ok(guard.iter().find(|request| &request.id == id).cloned())
    }

    fn resolve_if_pending(
        &self,
        id: &ExchangeId,
        status: ExchangeStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<ExchangeRequest>, StoreError> {
        let mut guard = self.records.lock().expect("exchange mutex poisoned");
        match guard.iter_mut().find(|request| &request.id == id) {
            Some(request) if request.status == ExchangeStatus::Pending => {
                request.status = status;
                request.resolved_at = Some(resolved_at);
                Ok(Some(request.clone()))
            }
            Some(_) => Ok(None),
            None => Err(StoreError::NotFound),
        }
    }

    fn pending_for(&self, email: &str) -> Result<Vec<ExchangeRequest>, StoreError> {
        let guard = self.records.lock().expect("exchange mutex poisoned");
        Ok(guard
            .iter()
            .filter(|request| {
                request.target_email == email && request.status == ExchangeStatus::Pending
            })
            .cloned()
            .collect())
    }
}

/// Fixed roster for local runs and the CLI demo. A deployment swaps this
/// for an adapter over the identity database.
pub(crate) struct SeedDirectory {
    users: Vec<User>,
}

impl Default for SeedDirectory {
    fn default() -> Self {
        Self {
            users: vec![
                User {
                    email: "coordinator@rescue.example".to_string(),
                    display_name: "Duty Coordinator".to_string(),
                    role: Role::Admin,
                    permissions: UserPermissions::default(),
                },
                User {
                    email: "anna@rescue.example".to_string(),
                    display_name: "Anna Visser".to_string(),
                    role: Role::Member,
                    permissions: UserPermissions::default(),
                },
                User {
                    email: "bram@rescue.example".to_string(),
                    display_name: "Bram de Groot".to_string(),
                    role: Role::Member,
                    permissions: UserPermissions::default(),
                },
                User {
                    email: "carla@rescue.example".to_string(),
                    display_name: "Carla Jansen".to_string(),
                    role: Role::Member,
                    permissions: UserPermissions {
                        allow_late_submission: true,
                    },
                },
            ],
        }
    }
}

impl Directory for SeedDirectory {
    fn user(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.iter().find(|user| user.email == email).cloned())
    }

    fn admins(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.is_admin())
            .cloned()
            .collect())
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.clone())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryBulletinStore {
    announcements: Mutex<Vec<Announcement>>,
    releases: Mutex<Vec<PublishedSchedule>>,
}

impl BulletinStore for InMemoryBulletinStore {
    fn insert_announcement(&self, announcement: Announcement) -> Result<Announcement, StoreError> {
        self.announcements
            .lock()
            .expect("bulletin mutex poisoned")
            .push(announcement.clone());
        Ok(announcement)
    }

    fn active(&self, on: NaiveDate) -> Result<Vec<Announcement>, StoreError> {
        let guard = self.announcements.lock().expect("bulletin mutex poisoned");
        Ok(guard
            .iter()
            .filter(|announcement| announcement.visible_on(on))
            .cloned()
            .collect())
    }

    fn record_release(
        &self,
        release: PublishedSchedule,
    ) -> Result<PublishedSchedule, StoreError> {
        self.releases
            .lock()
            .expect("bulletin mutex poisoned")
            .push(release.clone());
        Ok(release)
    }
}

/// Stand-in delivery channel that writes sends to the log. Real transports
/// (web push, chat-bot) plug in behind the same trait.
pub(crate) struct LogChannel {
    name: &'static str,
}

impl LogChannel {
    pub(crate) fn push() -> Self {
        Self { name: "push" }
    }

    pub(crate) fn chat_bot() -> Self {
        Self { name: "chat-bot" }
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), ChannelError> {
        info!(
            channel = self.name,
            recipient,
            title = %payload.title,
            require_interaction = payload.require_interaction,
            "notification delivered"
        );
        Ok(())
    }
}

pub(crate) fn parse_month(raw: &str) -> Result<MonthKey, String> {
    raw.parse::<MonthKey>().map_err(|err| err.to_string())
}
