//! Periodic campaign driver.
//!
//! Polls the singleton schedule row and, when a run is due, records an
//! automatic task and executes a full campaign under a timeout. The
//! schedule advances whether the campaign succeeded or not, so a
//! persistently failing campaign cannot busy-loop the driver.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::db::{self, Cadence, Database, ScrapingSchedule, TriggerKind};

use super::campaign::{CampaignOptions, CampaignRunner, CampaignScope};

/// Whether the schedule calls for a run at `now`.
///
/// `next_run_at` is authoritative when present; otherwise the due time is
/// derived from the last run and the cadence, and a schedule that has never
/// run is immediately due.
#[must_use]
pub fn schedule_is_due(schedule: &ScrapingSchedule, now: DateTime<Utc>) -> bool {
    if !schedule.enabled {
        return false;
    }
    if let Some(next) = schedule.next_run_at.as_deref().and_then(db::parse_timestamp) {
        return now >= next;
    }
    match (
        schedule.cadence_enum(),
        schedule.last_run_at.as_deref().and_then(db::parse_timestamp),
    ) {
        (Some(cadence), Some(last)) => now >= last + cadence.interval(),
        _ => true,
    }
}

/// Background loop that fires scheduled campaigns.
pub struct ScheduleDriver {
    db: Database,
    runner: Arc<CampaignRunner>,
    poll_interval: Duration,
    campaign_timeout: Duration,
}

impl ScheduleDriver {
    #[must_use]
    pub fn new(
        db: Database,
        runner: Arc<CampaignRunner>,
        poll_interval: Duration,
        campaign_timeout: Duration,
    ) -> Self {
        Self {
            db,
            runner,
            poll_interval,
            campaign_timeout,
        }
    }

    /// Poll until cancelled. Tick failures are logged and the loop keeps
    /// going.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            poll_interval = ?self.poll_interval,
            "Schedule driver started"
        );
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Schedule driver stopping");
                    return;
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
            match self.tick().await {
                Ok(true) => debug!("Scheduled campaign executed"),
                Ok(false) => {}
                Err(e) => error!("Schedule tick failed: {e:#}"),
            }
        }
    }

    /// One poll cycle. Returns `true` when a campaign was executed. At most
    /// one campaign fires per cycle; the advanced `next_run_at` keeps the
    /// next cycle quiet until the cadence elapses again.
    pub async fn tick(&self) -> Result<bool> {
        let pool = self.db.pool();
        let Some(schedule) = db::get_schedule(pool).await? else {
            return Ok(false);
        };

        let now = Utc::now();
        if !schedule_is_due(&schedule, now) {
            return Ok(false);
        }

        let options = CampaignOptions {
            window_days: schedule.window_days,
            fb_limit: usize::try_from(schedule.fb_limit).unwrap_or(5),
            tw_limit: usize::try_from(schedule.tw_limit).unwrap_or(5),
            skip_facebook: false,
            skip_twitter: false,
        };

        let params = serde_json::json!({
            "scope": "all",
            "window_days": options.window_days,
            "fb_limit": options.fb_limit,
            "tw_limit": options.tw_limit,
        });
        let task_id = db::create_task(pool, TriggerKind::Automatic, &params.to_string()).await?;
        db::mark_task_running(pool, task_id).await?;
        info!(task_id, cadence = %schedule.cadence, "Scheduled campaign starting");

        let outcome = tokio::time::timeout(
            self.campaign_timeout,
            self.runner.run(&CampaignScope::AllActive, &options),
        )
        .await;

        match outcome {
            Ok(Ok(summary)) => {
                db::complete_task(
                    pool,
                    task_id,
                    summary.total_articles as i64,
                    summary.total_fb_posts as i64,
                    summary.total_tweets as i64,
                    summary.total_flagged() as i64,
                )
                .await?;
            }
            Ok(Err(e)) => {
                warn!(task_id, "Scheduled campaign failed: {e:#}");
                db::fail_task(pool, task_id, &format!("{e:#}")).await?;
            }
            Err(_) => {
                warn!(task_id, "Scheduled campaign timed out");
                db::fail_task(pool, task_id, "timeout").await?;
            }
        }

        let cadence = schedule.cadence_enum().unwrap_or(Cadence::Daily);
        let finished = Utc::now();
        db::update_schedule_run(
            pool,
            &db::format_timestamp(finished),
            &db::format_timestamp(finished + cadence.interval()),
        )
        .await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn schedule(
        enabled: bool,
        cadence: &str,
        last_run_at: Option<String>,
        next_run_at: Option<String>,
    ) -> ScrapingSchedule {
        ScrapingSchedule {
            id: 1,
            enabled,
            cadence: cadence.to_string(),
            window_days: 30,
            fb_limit: 5,
            tw_limit: 5,
            last_run_at,
            next_run_at,
        }
    }

    #[test]
    fn test_disabled_schedule_is_never_due() {
        let now = Utc::now();
        let s = schedule(false, "hourly", None, None);
        assert!(!schedule_is_due(&s, now));
    }

    #[test]
    fn test_never_run_schedule_is_due() {
        let now = Utc::now();
        let s = schedule(true, "daily", None, None);
        assert!(schedule_is_due(&s, now));
    }

    #[test]
    fn test_daily_cadence_due_after_a_day() {
        let now = Utc::now();
        let last = db::format_timestamp(now - ChronoDuration::hours(25));
        let s = schedule(true, "daily", Some(last), None);
        assert!(schedule_is_due(&s, now));
    }

    #[test]
    fn test_daily_cadence_not_due_early() {
        let now = Utc::now();
        let last = db::format_timestamp(now - ChronoDuration::hours(2));
        let s = schedule(true, "daily", Some(last), None);
        assert!(!schedule_is_due(&s, now));
    }

    #[test]
    fn test_next_run_at_is_authoritative() {
        let now = Utc::now();
        // Cadence says due, the explicit next run does not.
        let last = db::format_timestamp(now - ChronoDuration::days(3));
        let next = db::format_timestamp(now + ChronoDuration::hours(1));
        let s = schedule(true, "daily", Some(last), Some(next));
        assert!(!schedule_is_due(&s, now));

        let past_next = db::format_timestamp(now - ChronoDuration::minutes(1));
        let s = schedule(true, "daily", None, Some(past_next));
        assert!(schedule_is_due(&s, now));
    }
}
