//! Daily triggers
//!
//! One loop drives three local-time events every day of the week:
//! - Rollover at midnight clears yesterday's answer and hint flags
//! - Reminder tells every user a riddle is coming
//! - Release sends today's riddle to everyone who has not solved it
//!
//! Broadcasts are best-effort: a failed delivery is logged and counted,
//! the rest of the batch still goes out.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::bot::{QuizBot, Reply};
use crate::clock::local_instant;
use crate::config::Schedule;
use crate::messenger::Messenger;

/// Deliveries in flight during one broadcast
const BROADCAST_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trigger {
    Rollover,
    Reminder,
    Release,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Next trigger strictly after `after`. Simultaneous triggers fire in
/// [`Trigger`] order.
pub fn next_due(schedule: &Schedule, after: DateTime<Tz>) -> (Trigger, DateTime<Tz>) {
    [
        (Trigger::Rollover, NaiveTime::MIN),
        (Trigger::Reminder, schedule.reminder),
        (Trigger::Release, schedule.release),
    ]
    .into_iter()
    .map(|(trigger, time)| (trigger, next_occurrence(time, after, schedule.tz)))
    .min_by_key(|(trigger, at)| (*at, *trigger))
    .unwrap_or((Trigger::Rollover, after + Duration::days(1)))
}

fn next_occurrence(time: NaiveTime, after: DateTime<Tz>, tz: Tz) -> DateTime<Tz> {
    let date = after.with_timezone(&tz).date_naive();
    let today = local_instant(date, time, tz);
    if today > after {
        today
    } else {
        local_instant(date + Duration::days(1), time, tz)
    }
}

/// Countdown notice sent at reminder time
pub fn reminder_text(schedule: &Schedule) -> String {
    let minutes = (schedule.release - schedule.reminder)
        .num_minutes()
        .rem_euclid(24 * 60);
    format!("⏰ A new riddle arrives in {} minutes!", minutes)
}

pub struct Scheduler {
    bot: Arc<QuizBot>,
    messenger: Arc<dyn Messenger>,
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(bot: Arc<QuizBot>, messenger: Arc<dyn Messenger>, schedule: Schedule) -> Self {
        Self {
            bot,
            messenger,
            schedule,
        }
    }

    /// Run for the lifetime of the process
    pub async fn run(self) {
        info!(
            "Scheduler started: reminder at {}, release at {} ({})",
            self.schedule.reminder, self.schedule.release, self.schedule.tz
        );

        let mut after = self.bot.clock().now();
        loop {
            let (trigger, at) = next_due(&self.schedule, after);
            let wait = (at - self.bot.clock().now()).to_std().unwrap_or_default();
            debug!("Next trigger {:?} at {} (in {:?})", trigger, at, wait);

            tokio::time::sleep(wait).await;
            self.fire(trigger).await;
            after = at;
        }
    }

    pub async fn fire(&self, trigger: Trigger) {
        match trigger {
            Trigger::Rollover => {
                self.rollover();
            }
            Trigger::Reminder => {
                self.remind().await;
            }
            Trigger::Release => {
                self.release().await;
            }
        }
    }

    /// Start a new quiz day. Returns the number of users whose flags were reset.
    pub fn rollover(&self) -> usize {
        match self.bot.ledger().begin_day() {
            Ok(reset) => {
                info!("Daily rollover reset {} users", reset);
                reset
            }
            Err(e) => {
                error!("Daily rollover failed: {}", e);
                0
            }
        }
    }

    /// Broadcast today's quiz. `None` when no quiz exists for today.
    pub async fn release(&self) -> Option<BroadcastReport> {
        let today = self.bot.clock().today();
        let quiz = match self.bot.catalog().get(today) {
            Ok(quiz) => quiz,
            Err(_) => {
                warn!("No quiz found for {}, skipping release", today);
                return None;
            }
        };

        let recipients = self.bot.ledger().pending_recipients();
        let report = self
            .broadcast(recipients, &QuizBot::release_reply(&quiz))
            .await;
        info!(
            "Released quiz for {}: {}/{} delivered, {} failed",
            today, report.delivered, report.recipients, report.failed
        );
        Some(report)
    }

    pub async fn remind(&self) -> BroadcastReport {
        let recipients = self.bot.ledger().all_ids();
        let report = self
            .broadcast(recipients, &Reply::text(reminder_text(&self.schedule)))
            .await;
        info!(
            "Reminder sent: {}/{} delivered, {} failed",
            report.delivered, report.recipients, report.failed
        );
        report
    }

    async fn broadcast(&self, recipients: Vec<String>, reply: &Reply) -> BroadcastReport {
        let messenger = self.messenger.as_ref();
        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..Default::default()
        };

        let results: Vec<_> = stream::iter(recipients)
            .map(|user_id| async move {
                let result = messenger.deliver(&user_id, &reply.text, reply.action).await;
                (user_id, result)
            })
            .buffer_unordered(BROADCAST_CONCURRENCY)
            .collect()
            .await;

        for (user_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to deliver to user {}: {}", user_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
