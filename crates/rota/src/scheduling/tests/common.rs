use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use crate::scheduling::domain::{
    Announcement, AvailabilitySubmission, ExchangeId, ExchangeRequest, ExchangeStatus, MonthKey,
    PublishedSchedule, Role, User, UserPermissions,
};
use crate::scheduling::repository::{
    BulletinStore, ChannelError, Directory, ExchangeStore, NotificationChannel,
    NotificationPayload, StoreError, SubmissionStore,
};
use crate::scheduling::service::CoordinationService;

pub(super) fn admin() -> User {
    User {
        email: "coordinator@rescue.example".to_string(),
        display_name: "Duty Coordinator".to_string(),
        role: Role::Admin,
        permissions: UserPermissions::default(),
    }
}

pub(super) fn second_admin() -> User {
    User {
        email: "backup-coordinator@rescue.example".to_string(),
        display_name: "Backup Coordinator".to_string(),
        role: Role::Admin,
        permissions: UserPermissions::default(),
    }
}

pub(super) fn anna() -> User {
    User {
        email: "anna@rescue.example".to_string(),
        display_name: "Anna Visser".to_string(),
        role: Role::Member,
        permissions: UserPermissions::default(),
    }
}

pub(super) fn bram() -> User {
    User {
        email: "bram@rescue.example".to_string(),
        display_name: "Bram de Groot".to_string(),
        role: Role::Member,
        permissions: UserPermissions::default(),
    }
}

/// Member granted the structured late-submission permission.
pub(super) fn late_member() -> User {
    User {
        email: "carla@rescue.example".to_string(),
        display_name: "Carla Jansen".to_string(),
        role: Role::Member,
        permissions: UserPermissions {
            allow_late_submission: true,
        },
    }
}

pub(super) fn roster() -> Vec<User> {
    vec![admin(), second_admin(), anna(), bram(), late_member()]
}

pub(super) fn june() -> MonthKey {
    MonthKey::new(2025, 6).expect("valid month")
}

pub(super) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
}

pub(super) fn june_dates(days: &[u32]) -> Vec<NaiveDate> {
    days.iter().map(|d| day(*d)).collect()
}

#[derive(Default)]
pub(super) struct MemorySubmissionStore {
    records: Mutex<HashMap<(String, MonthKey), AvailabilitySubmission>>,
}

impl SubmissionStore for MemorySubmissionStore {
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
        let mut months: Vec<_> = guard
            .values()
            .filter(|record| record.email == email)
            .cloned()
            .collect();
        months.sort_by_key(|record| record.month);
        Ok(months)
    }
}

#[derive(Default)]
pub(super) struct MemoryExchangeStore {
    records: Mutex<Vec<ExchangeRequest>>,
}

impl ExchangeStore for MemoryExchangeStore {
    fn insert(&self, request: ExchangeRequest) -> Result<ExchangeRequest, StoreError> {
        let mut guard = self.records.lock().expect("exchange mutex poisoned");
        guard.push(request.clone());
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

pub(super) struct MemoryDirectory {
    users: Vec<User>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self { users: roster() }
    }
}

impl Directory for MemoryDirectory {
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
pub(super) struct MemoryBulletins {
    announcements: Mutex<Vec<Announcement>>,
    releases: Mutex<Vec<PublishedSchedule>>,
}

impl MemoryBulletins {
    pub(super) fn releases(&self) -> Vec<PublishedSchedule> {
        self.releases.lock().expect("bulletin mutex poisoned").clone()
    }
}

impl BulletinStore for MemoryBulletins {
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

/// Channel double that records every send it sees.
pub(super) struct RecordingChannel {
    name: &'static str,
    sends: Mutex<Vec<(String, NotificationPayload)>>,
}

impl RecordingChannel {
    pub(super) fn named(name: &'static str) -> Self {
        Self {
            name,
            sends: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sends(&self) -> Vec<(String, NotificationPayload)> {
        self.sends.lock().expect("channel mutex poisoned").clone()
    }

    pub(super) fn recipients(&self) -> Vec<String> {
        self.sends()
            .into_iter()
            .map(|(recipient, _)| recipient)
            .collect()
    }
}

impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), ChannelError> {
        self.sends
            .lock()
            .expect("channel mutex poisoned")
            .push((recipient.to_string(), payload.clone()));
        Ok(())
    }
}

/// Channel double whose transport always fails.
pub(super) struct FailingChannel;

impl NotificationChannel for FailingChannel {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn send(&self, _recipient: &str, _payload: &NotificationPayload) -> Result<(), ChannelError> {
        Err(ChannelError::Transport("connection refused".to_string()))
    }
}

pub(super) struct UnavailableSubmissionStore;

impl SubmissionStore for UnavailableSubmissionStore {
    fn insert(
        &self,
        _record: AvailabilitySubmission,
    ) -> Result<AvailabilitySubmission, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AvailabilitySubmission) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _email: &str,
        _month: MonthKey,
    ) -> Result<Option<AvailabilitySubmission>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _email: &str) -> Result<Vec<AvailabilitySubmission>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryCoordinationService = CoordinationService<
    MemorySubmissionStore,
    MemoryExchangeStore,
    MemoryDirectory,
    MemoryBulletins,
>;

pub(super) struct Fixture {
    pub(super) service: Arc<MemoryCoordinationService>,
    pub(super) submissions: Arc<MemorySubmissionStore>,
    pub(super) bulletins: Arc<MemoryBulletins>,
    pub(super) push: Arc<RecordingChannel>,
    pub(super) chat: Arc<RecordingChannel>,
}

pub(super) fn build_service() -> Fixture {
    let submissions = Arc::new(MemorySubmissionStore::default());
    let exchanges = Arc::new(MemoryExchangeStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    let bulletins = Arc::new(MemoryBulletins::default());
    let push = Arc::new(RecordingChannel::named("push"));
    let chat = Arc::new(RecordingChannel::named("chat-bot"));

    let channels: Vec<Arc<dyn NotificationChannel>> = vec![push.clone(), chat.clone()];
    let service = Arc::new(CoordinationService::new(
        submissions.clone(),
        exchanges.clone(),
        directory,
        bulletins.clone(),
        channels,
    ));

    Fixture {
        service,
        submissions,
        bulletins,
        push,
        chat,
    }
}
