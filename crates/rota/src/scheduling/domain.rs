use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for shift-exchange requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeId(pub String);

/// Role granted by the identity subsystem; the engine only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

/// Structured per-user permission record. Replaces the historical
/// string-keyed settings lookup so the directory can index on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// Accept availability edits after the 15th of the month.
    pub allow_late_submission: bool,
}

/// Roster member as read from the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: UserPermissions,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Calendar month key, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::OutOfRange { month });
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap_or_default())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (year, month) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| MonthKeyError::Malformed(raw.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthKeyError::Malformed(raw.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthKeyError::Malformed(raw.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthKeyError {
    #[error("month key must look like YYYY-MM, got '{0}'")]
    Malformed(String),
    #[error("month {month} is not in 1..=12")]
    OutOfRange { month: u32 },
}

/// Monthly availability as accepted by the submission ledger.
///
/// Records are created on the first accepted save for a `(email, month)`
/// pair, overwritten in place on later saves within the edit cap, and
/// never deleted; history views read them back for audit purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySubmission {
    pub email: String,
    pub month: MonthKey,
    pub dates: Vec<NaiveDate>,
    pub overnights: Vec<NaiveDate>,
    pub edit_count: u8,
    pub submitted_at: DateTime<Utc>,
}

/// Shift slot within a roster day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftSlot {
    Morning,
    Day,
    Night,
}

impl ShiftSlot {
    pub const fn label(self) -> &'static str {
        match self {
            ShiftSlot::Morning => "morning",
            ShiftSlot::Day => "day",
            ShiftSlot::Night => "night",
        }
    }
}

/// Lifecycle status of an exchange request. Transitions are strictly
/// one-way: `Pending` resolves once and the record stays terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ExchangeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ExchangeStatus::Pending)
    }
}

/// Decision a target holder takes on a pending exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDecision {
    Accept,
    Reject,
}

impl ExchangeDecision {
    pub const fn resolves_to(self) -> ExchangeStatus {
        match self {
            ExchangeDecision::Accept => ExchangeStatus::Accepted,
            ExchangeDecision::Reject => ExchangeStatus::Rejected,
        }
    }
}

/// A proposal by one member to take over a specific shift held by another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub id: ExchangeId,
    pub requester_email: String,
    pub target_email: String,
    pub date: NaiveDate,
    pub shift: ShiftSlot,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Broadcast notice, visible while `start_date <= today <= end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub title: String,
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Announcement {
    pub fn visible_on(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

/// Record of an official roster release for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedSchedule {
    pub month: MonthKey,
    pub released_at: DateTime<Utc>,
}

/// Events produced by ledger and lifecycle mutations. The dispatcher maps
/// each of these to a fixed audience and payload; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    ScheduleSubmitted {
        email: String,
        month: MonthKey,
        edit_count: u8,
    },
    ExchangeProposed {
        request: ExchangeRequest,
    },
    ExchangeResolved {
        status: ExchangeStatus,
        requester_email: String,
        target_name: String,
        date: NaiveDate,
        shift: ShiftSlot,
    },
    SchedulePublished {
        month: MonthKey,
    },
    AnnouncementCreated {
        title: String,
    },
    DeadlineReminder {
        days_remaining: u8,
    },
}
