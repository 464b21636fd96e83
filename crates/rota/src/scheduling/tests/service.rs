use super::common::*;
use crate::scheduling::domain::{
    Announcement, ExchangeDecision, ExchangeStatus, MonthKey, ShiftSlot,
};
use crate::scheduling::ledger::LedgerError;
use crate::scheduling::lifecycle::ExchangeError;
use crate::scheduling::repository::SubmissionStore;
use crate::scheduling::service::CoordinationError;

#[test]
fn empty_selection_is_rejected_before_the_ledger() {
    let fixture = build_service();

    match fixture.service.submit_availability(
        &anna().email,
        june(),
        Vec::new(),
        Vec::new(),
        day(10),
    ) {
        Err(CoordinationError::EmptySelection) => {}
        other => panic!("expected empty-selection error, got {other:?}"),
    }
    assert!(fixture
        .submissions
        .fetch(&anna().email, june())
        .expect("fetch succeeds")
        .is_none());
    assert!(fixture.push.sends().is_empty(), "no dispatch for a rejection");
}

#[test]
fn submission_notifies_admins_on_both_channels() {
    let fixture = build_service();

    let record = fixture
        .service
        .submit_availability(
            &anna().email,
            june(),
            june_dates(&[3, 7, 21]),
            Vec::new(),
            day(10),
        )
        .expect("save accepted");

    assert_eq!(record.edit_count, 1);
    let mut push_recipients = fixture.push.recipients();
    push_recipients.sort();
    let mut expected = vec![admin().email, second_admin().email];
    expected.sort();
    assert_eq!(push_recipients, expected);
    assert_eq!(fixture.chat.sends().len(), 2);
}

#[test]
fn rejected_mutations_send_nothing() {
    let fixture = build_service();

    for _ in 0..2 {
        fixture
            .service
            .submit_availability(
                &anna().email,
                june(),
                june_dates(&[3]),
                Vec::new(),
                day(10),
            )
            .expect("save accepted");
    }
    let sends_before = fixture.push.sends().len();

    match fixture.service.submit_availability(
        &anna().email,
        june(),
        june_dates(&[4]),
        Vec::new(),
        day(13),
    ) {
        Err(CoordinationError::Ledger(LedgerError::EditLimitExceeded { .. })) => {}
        other => panic!("expected edit limit error, got {other:?}"),
    }
    assert_eq!(fixture.push.sends().len(), sends_before);
}

#[test]
fn deadline_rejection_leaves_ledger_untouched() {
    let fixture = build_service();

    match fixture.service.submit_availability(
        &anna().email,
        june(),
        june_dates(&[20]),
        Vec::new(),
        day(16),
    ) {
        Err(CoordinationError::Ledger(LedgerError::DeadlinePassed)) => {}
        other => panic!("expected deadline error, got {other:?}"),
    }
    assert!(fixture
        .submissions
        .fetch(&anna().email, june())
        .expect("fetch succeeds")
        .is_none());
    assert!(fixture.push.sends().is_empty());
}

#[test]
fn unknown_members_cannot_submit() {
    let fixture = build_service();

    match fixture.service.submit_availability(
        "stranger@rescue.example",
        june(),
        june_dates(&[3]),
        Vec::new(),
        day(10),
    ) {
        Err(CoordinationError::UnknownUser(email)) => {
            assert_eq!(email, "stranger@rescue.example");
        }
        other => panic!("expected unknown-user error, got {other:?}"),
    }
}

#[test]
fn proposal_notifies_the_target_with_interaction() {
    let fixture = build_service();

    let request = fixture
        .service
        .propose_exchange(&anna().email, &bram().email, day(20), ShiftSlot::Night)
        .expect("proposal accepted");

    assert_eq!(request.status, ExchangeStatus::Pending);
    let sends = fixture.push.sends();
    assert_eq!(sends.len(), 1);
    let (recipient, payload) = &sends[0];
    assert_eq!(recipient, &bram().email);
    assert!(payload.require_interaction);
}

#[test]
fn response_notifies_the_requester() {
    let fixture = build_service();

    let request = fixture
        .service
        .propose_exchange(&anna().email, &bram().email, day(20), ShiftSlot::Night)
        .expect("proposal accepted");
    let resolved = fixture
        .service
        .respond_to_exchange(&request.id, &bram().email, ExchangeDecision::Accept)
        .expect("response accepted");

    assert_eq!(resolved.status, ExchangeStatus::Accepted);
    assert!(resolved.resolved_at.is_some());
    let sends = fixture.push.sends();
    let (recipient, payload) = sends.last().expect("resolution notified");
    assert_eq!(recipient, &anna().email);
    assert!(payload.body.contains(&bram().display_name));

    match fixture
        .service
        .respond_to_exchange(&request.id, &bram().email, ExchangeDecision::Accept)
    {
        Err(CoordinationError::Exchange(ExchangeError::AlreadyResolved)) => {}
        other => panic!("expected already-resolved error, got {other:?}"),
    }
}

#[test]
fn pending_interstitial_reads_through_the_facade() {
    let fixture = build_service();

    assert!(fixture
        .service
        .pending_exchanges(&bram().email)
        .expect("pending listed")
        .is_empty());

    fixture
        .service
        .propose_exchange(&anna().email, &bram().email, day(20), ShiftSlot::Night)
        .expect("proposal accepted");

    let pending = fixture
        .service
        .pending_exchanges(&bram().email)
        .expect("pending listed");
    assert_eq!(pending.len(), 1);
}

#[test]
fn publishing_a_schedule_notifies_everyone() {
    let fixture = build_service();

    let release = fixture
        .service
        .publish_schedule(june())
        .expect("release recorded");

    assert_eq!(release.month, june());
    assert_eq!(fixture.bulletins.releases().len(), 1);
    assert_eq!(fixture.push.sends().len(), roster().len());
}

#[test]
fn announcement_window_is_validated_before_storage() {
    let fixture = build_service();

    let backwards = Announcement {
        title: "Harbor drill".to_string(),
        content: "Joint drill with the harbor service.".to_string(),
        start_date: day(20),
        end_date: day(10),
    };
    match fixture.service.publish_announcement(backwards) {
        Err(CoordinationError::InvalidAnnouncementWindow) => {}
        other => panic!("expected window error, got {other:?}"),
    }
    assert!(fixture.push.sends().is_empty());
}

#[test]
fn announcements_are_visible_only_inside_their_window() {
    let fixture = build_service();

    fixture
        .service
        .publish_announcement(Announcement {
            title: "Harbor drill".to_string(),
            content: "Joint drill with the harbor service.".to_string(),
            start_date: day(10),
            end_date: day(20),
        })
        .expect("announcement stored");

    assert_eq!(
        fixture
            .service
            .active_announcements(day(15))
            .expect("query succeeds")
            .len(),
        1
    );
    assert!(fixture
        .service
        .active_announcements(day(21))
        .expect("query succeeds")
        .is_empty());
    assert!(fixture
        .service
        .active_announcements(day(9))
        .expect("query succeeds")
        .is_empty());
}

#[test]
fn deadline_reminder_is_a_noop_once_closed() {
    let fixture = build_service();

    let outcome = fixture
        .service
        .send_deadline_reminder(day(12))
        .expect("reminder sent inside the window");
    assert!(outcome.success);
    assert_eq!(fixture.push.sends().len(), roster().len());

    assert!(fixture.service.send_deadline_reminder(day(16)).is_none());
}

#[test]
fn submission_window_uses_the_member_permission() {
    let fixture = build_service();

    let closed = fixture
        .service
        .submission_window(&anna().email, day(16))
        .expect("window evaluated");
    assert!(!closed.accepts_submissions());

    let reopened = fixture
        .service
        .submission_window(&late_member().email, day(16))
        .expect("window evaluated");
    assert!(reopened.accepts_submissions());
}

#[test]
fn history_collects_every_month() {
    let fixture = build_service();
    let july = MonthKey::new(2025, 7).expect("valid month");

    fixture
        .service
        .submit_availability(&anna().email, june(), june_dates(&[3]), Vec::new(), day(10))
        .expect("june save accepted");
    fixture
        .service
        .submit_availability(&anna().email, july, june_dates(&[4]), Vec::new(), day(11))
        .expect("july save accepted");

    let history = fixture
        .service
        .submission_history(&anna().email)
        .expect("history listed");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].month, june());
    assert_eq!(history[1].month, july);
}

#[test]
fn dispatch_failure_never_fails_the_mutation() {
    use crate::scheduling::repository::NotificationChannel;
    use crate::scheduling::service::CoordinationService;
    use std::sync::Arc;

    let submissions = Arc::new(MemorySubmissionStore::default());
    let exchanges = Arc::new(MemoryExchangeStore::default());
    let bulletins = Arc::new(MemoryBulletins::default());
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(FailingChannel)];
    let service = CoordinationService::new(
        submissions.clone(),
        exchanges,
        Arc::new(MemoryDirectory::default()),
        bulletins,
        channels,
    );

    let record = service
        .submit_availability(&anna().email, june(), june_dates(&[3]), Vec::new(), day(10))
        .expect("mutation survives a dead channel");
    assert_eq!(record.edit_count, 1);
    assert!(submissions
        .fetch(&anna().email, june())
        .expect("fetch succeeds")
        .is_some());
}
