//! Programmatic trigger surface.
//!
//! Validates trigger requests, records them as task rows, and runs the
//! campaign either in the background (fire-and-forget trigger) or inline
//! (CLI). Also owns schedule management.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{self, Cadence, Database, ScrapingSchedule, ScrapingTask, TriggerKind};

use super::campaign::{CampaignOptions, CampaignRunner, CampaignScope, CampaignSummary};

/// A validated-on-entry trigger request.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerParams {
    /// Site URL to collect, or `None` for every active source.
    pub site_url: Option<String>,
    pub window_days: i64,
    pub fb_limit: usize,
    pub tw_limit: usize,
    pub skip_facebook: bool,
    pub skip_twitter: bool,
}

impl TriggerParams {
    /// Defaults for a full run from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            site_url: None,
            window_days: config.window_days,
            fb_limit: config.fb_post_limit,
            tw_limit: config.tweet_limit,
            skip_facebook: false,
            skip_twitter: false,
        }
    }

    fn scope(&self) -> CampaignScope {
        match &self.site_url {
            Some(url) => CampaignScope::Single(url.clone()),
            None => CampaignScope::AllActive,
        }
    }

    fn options(&self) -> CampaignOptions {
        CampaignOptions {
            window_days: self.window_days,
            fb_limit: self.fb_limit,
            tw_limit: self.tw_limit,
            skip_facebook: self.skip_facebook,
            skip_twitter: self.skip_twitter,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.window_days < 1 {
            bail!("window_days must be at least 1");
        }
        if let Some(raw) = &self.site_url {
            let parsed = url::Url::parse(raw.trim())
                .map_err(|e| anyhow::anyhow!("invalid site url '{raw}': {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("site url '{raw}' must be http or https");
            }
        }
        Ok(())
    }
}

/// Entry point for manual campaigns and schedule management.
pub struct ScrapeService {
    db: Database,
    runner: Arc<CampaignRunner>,
    campaign_timeout: Duration,
}

impl ScrapeService {
    #[must_use]
    pub fn new(db: Database, runner: Arc<CampaignRunner>, campaign_timeout: Duration) -> Self {
        Self {
            db,
            runner,
            campaign_timeout,
        }
    }

    /// Validate and queue a manual campaign, returning the task id
    /// immediately. The campaign runs in the background under the configured
    /// timeout; its result lands on the task row.
    pub async fn trigger(&self, params: TriggerParams) -> Result<i64> {
        params.validate()?;

        let pool = self.db.pool();
        let task_id = db::create_task(
            pool,
            TriggerKind::Manual,
            &serde_json::to_string(&params)?,
        )
        .await?;
        info!(task_id, "Manual campaign queued");

        let db = self.db.clone();
        let runner = Arc::clone(&self.runner);
        let timeout = self.campaign_timeout;
        tokio::spawn(async move {
            if let Err(e) = execute_task(&db, &runner, task_id, &params, timeout).await {
                // The task row could not be finalized; the campaign outcome
                // is already logged.
                warn!(task_id, "Failed to record task outcome: {e:#}");
            }
        });

        Ok(task_id)
    }

    /// Validate, record, and run a manual campaign inline, returning the
    /// summary. Used by the CLI.
    pub async fn trigger_and_wait(
        &self,
        params: TriggerParams,
    ) -> Result<(i64, Option<CampaignSummary>)> {
        params.validate()?;

        let pool = self.db.pool();
        let task_id = db::create_task(
            pool,
            TriggerKind::Manual,
            &serde_json::to_string(&params)?,
        )
        .await?;
        let summary =
            execute_task(&self.db, &self.runner, task_id, &params, self.campaign_timeout).await?;
        Ok((task_id, summary))
    }

    /// Create or replace the singleton schedule. The first automatic run is
    /// one cadence interval away.
    pub async fn set_schedule(
        &self,
        enabled: bool,
        cadence: Cadence,
        window_days: i64,
        fb_limit: i64,
        tw_limit: i64,
    ) -> Result<()> {
        if window_days < 1 {
            bail!("window_days must be at least 1");
        }
        let next_run = db::format_timestamp(Utc::now() + cadence.interval());
        db::set_schedule(
            self.db.pool(),
            enabled,
            cadence,
            window_days,
            fb_limit,
            tw_limit,
            &next_run,
        )
        .await?;
        info!(cadence = cadence.as_str(), enabled, "Schedule updated");
        Ok(())
    }

    pub async fn get_schedule(&self) -> Result<Option<ScrapingSchedule>> {
        db::get_schedule(self.db.pool()).await
    }

    pub async fn clear_schedule(&self) -> Result<()> {
        db::clear_schedule(self.db.pool()).await?;
        info!("Schedule cleared");
        Ok(())
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<ScrapingTask>> {
        db::get_task(self.db.pool(), id).await
    }

    pub async fn list_tasks(&self, limit: i64, offset: i64) -> Result<Vec<ScrapingTask>> {
        db::list_tasks(self.db.pool(), limit, offset).await
    }
}

/// Run one recorded campaign and finalize its task row. Returns the summary
/// when the campaign finished in time.
async fn execute_task(
    db: &Database,
    runner: &CampaignRunner,
    task_id: i64,
    params: &TriggerParams,
    timeout: Duration,
) -> Result<Option<CampaignSummary>> {
    let pool = db.pool();
    db::mark_task_running(pool, task_id).await?;

    let outcome = tokio::time::timeout(
        timeout,
        runner.run(&params.scope(), &params.options()),
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
            Ok(Some(summary))
        }
        Ok(Err(e)) => {
            warn!(task_id, "Campaign failed: {e:#}");
            db::fail_task(pool, task_id, &format!("{e:#}")).await?;
            Ok(None)
        }
        Err(_) => {
            warn!(task_id, "Campaign timed out");
            db::fail_task(pool, task_id, "timeout").await?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(site_url: Option<&str>, window_days: i64) -> TriggerParams {
        TriggerParams {
            site_url: site_url.map(ToString::to_string),
            window_days,
            fb_limit: 5,
            tw_limit: 5,
            skip_facebook: false,
            skip_twitter: false,
        }
    }

    #[test]
    fn test_validate_accepts_full_run() {
        assert!(params(None, 30).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        assert!(params(None, 0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(params(Some("not a url"), 7).validate().is_err());
        assert!(params(Some("ftp://example.com"), 7).validate().is_err());
        assert!(params(Some("https://example.com"), 7).validate().is_ok());
    }
}
