use crate::infra::{
    parse_month, InMemoryBulletinStore, InMemoryExchangeStore, InMemorySubmissionStore,
    SeedDirectory,
};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

use rota::error::AppError;
use rota::scheduling::{
    Announcement, ChannelError, CoordinationService, ExchangeDecision, MonthKey,
    NotificationChannel, NotificationPayload, ShiftSlot,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Roster month to walk through (YYYY-MM). Defaults to the current month.
    #[arg(long, value_parser = parse_month)]
    pub(crate) month: Option<MonthKey>,
}

/// Channel that narrates every send on stdout so the walkthrough is visible
/// without a tracing subscriber.
struct ConsoleChannel {
    name: &'static str,
}

impl NotificationChannel for ConsoleChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, recipient: &str, payload: &NotificationPayload) -> Result<(), ChannelError> {
        println!(
            "    [{}] -> {}: {} — {}",
            self.name, recipient, payload.title, payload.body
        );
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let month = args.month.unwrap_or_else(|| {
        let today = Local::now().date_naive();
        MonthKey::from_date(today)
    });
    let day = |d: u32| -> NaiveDate { month.first_day() + Duration::days(i64::from(d) - 1) };

    let channels: Vec<Arc<dyn NotificationChannel>> =
        vec![Arc::new(ConsoleChannel { name: "push" })];
    let service = CoordinationService::new(
        Arc::new(InMemorySubmissionStore::default()),
        Arc::new(InMemoryExchangeStore::default()),
        Arc::new(SeedDirectory::default()),
        Arc::new(InMemoryBulletinStore::default()),
        channels,
    );

    println!("Shift coordination walkthrough for {month}");
    println!("Roster: coordinator, anna, bram, carla (late-submission permission)");

    println!("\nDay 10: anna submits availability");
    let record = service.submit_availability(
        "anna@rescue.example",
        month,
        vec![day(3), day(7), day(21)],
        Vec::new(),
        day(10),
    )?;
    println!("  accepted, save {} of 2", record.edit_count);

    println!("\nDay 12: anna revises her availability");
    let record = service.submit_availability(
        "anna@rescue.example",
        month,
        vec![day(3), day(7), day(21), day(24), day(28)],
        vec![day(28)],
        day(12),
    )?;
    println!("  accepted, save {} of 2", record.edit_count);

    println!("\nDay 13: anna tries a third save");
    match service.submit_availability(
        "anna@rescue.example",
        month,
        vec![day(1)],
        Vec::new(),
        day(13),
    ) {
        Err(err) => println!("  rejected: {err}"),
        Ok(_) => println!("  unexpectedly accepted"),
    }

    println!("\nDay 16: bram submits after the deadline");
    match service.submit_availability(
        "bram@rescue.example",
        month,
        vec![day(20)],
        Vec::new(),
        day(16),
    ) {
        Err(err) => println!("  rejected: {err}"),
        Ok(_) => println!("  unexpectedly accepted"),
    }

    println!("\nDay 16: carla submits with her late permission");
    let record = service.submit_availability(
        "carla@rescue.example",
        month,
        vec![day(19), day(26)],
        Vec::new(),
        day(16),
    )?;
    println!("  accepted, save {} of 2", record.edit_count);

    println!("\nDay 17: anna asks bram for the night shift on the 20th");
    let request = service.propose_exchange(
        "anna@rescue.example",
        "bram@rescue.example",
        day(20),
        ShiftSlot::Night,
    )?;
    let pending = service.pending_exchanges("bram@rescue.example")?;
    println!("  bram now has {} pending request(s)", pending.len());

    println!("\nDay 18: bram accepts");
    let resolved =
        service.respond_to_exchange(&request.id, "bram@rescue.example", ExchangeDecision::Accept)?;
    println!("  request {} is now {}", resolved.id.0, resolved.status.label());

    println!("\nDay 18: bram answers again by accident");
    match service.respond_to_exchange(
        &request.id,
        "bram@rescue.example",
        ExchangeDecision::Reject,
    ) {
        Err(err) => println!("  rejected: {err}"),
        Ok(_) => println!("  unexpectedly accepted"),
    }

    println!("\nCoordinator publishes the official roster");
    service.publish_schedule(month)?;

    println!("\nCoordinator posts an announcement");
    service.publish_announcement(Announcement {
        title: "Boat maintenance weekend".to_string(),
        content: "The rigid inflatable is out of service on the last weekend.".to_string(),
        start_date: day(1),
        end_date: day(28),
    })?;

    println!("\nScheduler tick on day 12 sends a deadline reminder");
    if let Some(outcome) = service.send_deadline_reminder(day(12)) {
        println!("  reminded {} recipient(s)", outcome.sent);
    }

    println!("\nScheduler tick on day {} stays quiet (window closed)", day(16).day());
    if service.send_deadline_reminder(day(16)).is_none() {
        println!("  no reminder sent");
    }

    Ok(())
}
