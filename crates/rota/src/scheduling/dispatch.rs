use std::sync::Arc;

use tracing::warn;

use super::domain::{DomainEvent, ExchangeStatus};
use super::repository::{Directory, NotificationChannel, NotificationPayload, StoreError};

/// Resolved audience for one dispatch call. Computed per event from the
/// fixed policy below, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Explicit member emails.
    Members(Vec<String>),
    /// Every admin in the directory at dispatch time.
    Admins,
    /// Every roster member in the directory at dispatch time.
    Everyone,
}

/// Result of one best-effort fan-out. The dispatcher reports failures here
/// instead of returning an error so a committed domain mutation is never
/// unwound by a delivery problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    pub sent: usize,
    pub message: Option<String>,
}

impl DispatchOutcome {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            sent: 0,
            message: Some(message),
        }
    }
}

/// Fixed event-to-audience policy. Call sites do not get to choose.
pub fn audience_for(event: &DomainEvent) -> Audience {
    match event {
        DomainEvent::ScheduleSubmitted { .. } => Audience::Admins,
        DomainEvent::ExchangeProposed { request } => {
            Audience::Members(vec![request.target_email.clone()])
        }
        DomainEvent::ExchangeResolved {
            requester_email, ..
        } => Audience::Members(vec![requester_email.clone()]),
        DomainEvent::SchedulePublished { .. }
        | DomainEvent::AnnouncementCreated { .. }
        | DomainEvent::DeadlineReminder { .. } => Audience::Everyone,
    }
}

/// Render the channel payload for an event. Only an exchange proposal asks
/// the recipient to interact; everything else is informational.
pub fn payload_for(event: &DomainEvent) -> NotificationPayload {
    match event {
        DomainEvent::ScheduleSubmitted {
            email,
            month,
            edit_count,
        } => NotificationPayload {
            title: "Availability submitted".to_string(),
            body: format!("{email} saved availability for {month} (save {edit_count} of 2)"),
            url: Some("/admin/submissions".to_string()),
            tag: Some(format!("submission-{month}-{email}")),
            require_interaction: false,
        },
        DomainEvent::ExchangeProposed { request } => NotificationPayload {
            title: "Shift exchange requested".to_string(),
            body: format!(
                "{} asks to take your {} shift on {}",
                request.requester_email,
                request.shift.label(),
                request.date
            ),
            url: Some("/exchanges/pending".to_string()),
            tag: Some(format!("exchange-{}", request.id.0)),
            require_interaction: true,
        },
        DomainEvent::ExchangeResolved {
            status,
            target_name,
            date,
            shift,
            ..
        } => {
            let verb = match status {
                ExchangeStatus::Accepted => "accepted",
                ExchangeStatus::Rejected => "declined",
                ExchangeStatus::Pending => "left pending",
            };
            NotificationPayload {
                title: "Shift exchange answered".to_string(),
                body: format!(
                    "{target_name} {verb} your request for the {} shift on {date}",
                    shift.label()
                ),
                url: Some("/exchanges".to_string()),
                tag: None,
                require_interaction: false,
            }
        }
        DomainEvent::SchedulePublished { month } => NotificationPayload {
            title: "Duty roster published".to_string(),
            body: format!("The official roster for {month} is out"),
            url: Some("/schedule".to_string()),
            tag: Some(format!("roster-{month}")),
            require_interaction: false,
        },
        DomainEvent::AnnouncementCreated { title } => NotificationPayload {
            title: "New announcement".to_string(),
            body: title.clone(),
            url: Some("/announcements".to_string()),
            tag: None,
            require_interaction: false,
        },
        DomainEvent::DeadlineReminder { days_remaining } => NotificationPayload {
            title: "Availability deadline".to_string(),
            body: match days_remaining {
                0 => "Today is the last day to submit availability".to_string(),
                1 => "Availability submissions close tomorrow".to_string(),
                n => format!("Availability submissions close in {n} days"),
            },
            url: Some("/availability".to_string()),
            tag: Some("deadline-reminder".to_string()),
            require_interaction: false,
        },
    }
}

/// Maps domain events to notification sends across every configured
/// channel. Membership of role-based audiences is read from the directory
/// on each call so admin changes take effect between sends.
pub struct NotificationDispatcher<D> {
    directory: Arc<D>,
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl<D> NotificationDispatcher<D>
where
    D: Directory,
{
    pub fn new(directory: Arc<D>, channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            directory,
            channels,
        }
    }

    /// Fan one event out to its audience. Per-recipient, per-channel
    /// failures are logged and folded into the outcome; this method never
    /// returns an error.
    pub fn dispatch(&self, event: &DomainEvent) -> DispatchOutcome {
        let payload = payload_for(event);
        let recipients = match self.resolve(audience_for(event)) {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(error = %err, "audience resolution failed, dropping notification");
                return DispatchOutcome::failed(format!("audience resolution failed: {err}"));
            }
        };

        let mut sent = 0;
        let mut failures = Vec::new();
        for recipient in &recipients {
            for channel in &self.channels {
                match channel.send(recipient, &payload) {
                    Ok(()) => sent += 1,
                    Err(err) => {
                        warn!(
                            channel = channel.name(),
                            recipient = %recipient,
                            error = %err,
                            "notification delivery failed"
                        );
                        failures.push(format!("{} -> {}: {}", channel.name(), recipient, err));
                    }
                }
            }
        }

        DispatchOutcome {
            success: failures.is_empty(),
            sent,
            message: if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            },
        }
    }

    fn resolve(&self, audience: Audience) -> Result<Vec<String>, StoreError> {
        let recipients = match audience {
            Audience::Members(emails) => emails,
            Audience::Admins => self
                .directory
                .admins()?
                .into_iter()
                .map(|user| user.email)
                .collect(),
            Audience::Everyone => self
                .directory
                .all_users()?
                .into_iter()
                .map(|user| user.email)
                .collect(),
        };
        Ok(recipients)
    }
}
