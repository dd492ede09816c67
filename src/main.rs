use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediascan::config::Config;
use mediascan::db::{self, Cadence, Database};
use mediascan::scrape::{CampaignRunner, ScheduleDriver, ScrapeService, TriggerParams};

#[derive(Parser)]
#[command(name = "mediascan", about = "Media outlet scraping and monitoring pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the schedule driver until interrupted.
    Serve,
    /// Run one campaign now and print the result.
    Scrape {
        /// Collect a single site instead of every active source.
        #[arg(long)]
        url: Option<String>,
        /// Collection window in days.
        #[arg(long)]
        days: Option<i64>,
        /// Facebook posts to fetch per page.
        #[arg(long)]
        fb_posts: Option<usize>,
        /// Tweets to fetch per account.
        #[arg(long)]
        tweets: Option<usize>,
        /// Skip Facebook collection.
        #[arg(long)]
        skip_facebook: bool,
        /// Skip Twitter collection.
        #[arg(long)]
        skip_twitter: bool,
    },
    /// Configure the automatic collection schedule.
    Schedule {
        /// hourly, daily or weekly.
        cadence: String,
        /// Disable instead of enable.
        #[arg(long)]
        disable: bool,
    },
    /// Remove the automatic collection schedule.
    Unschedule,
    /// Show recent campaign tasks.
    Tasks {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let runner = Arc::new(CampaignRunner::from_config(db.clone(), &config).await);
    let service = ScrapeService::new(db.clone(), Arc::clone(&runner), config.campaign_timeout);

    match cli.command {
        Command::Serve => serve(db, runner, &config).await,
        Command::Scrape {
            url,
            days,
            fb_posts,
            tweets,
            skip_facebook,
            skip_twitter,
        } => {
            let params = TriggerParams {
                site_url: url,
                window_days: days.unwrap_or(config.window_days),
                fb_limit: fb_posts.unwrap_or(config.fb_post_limit),
                tw_limit: tweets.unwrap_or(config.tweet_limit),
                skip_facebook,
                skip_twitter,
            };
            let (task_id, summary) = service.trigger_and_wait(params).await?;
            match summary {
                Some(summary) => {
                    info!(
                        task_id,
                        articles = summary.total_articles,
                        fb_posts = summary.total_fb_posts,
                        tweets = summary.total_tweets,
                        flagged = summary.total_flagged(),
                        "Campaign completed"
                    );
                    for media in &summary.top_media {
                        info!(
                            name = %media.name,
                            score = media.influence_score,
                            "Ranking"
                        );
                    }
                }
                None => error!(task_id, "Campaign did not complete; see task record"),
            }
            Ok(())
        }
        Command::Schedule { cadence, disable } => {
            let cadence = Cadence::from_str(&cadence)
                .with_context(|| format!("unknown cadence '{cadence}'"))?;
            service
                .set_schedule(
                    !disable,
                    cadence,
                    config.window_days,
                    config.fb_post_limit as i64,
                    config.tweet_limit as i64,
                )
                .await
        }
        Command::Unschedule => service.clear_schedule().await,
        Command::Tasks { limit } => {
            for task in service.list_tasks(limit, 0).await? {
                info!(
                    id = task.id,
                    trigger = %task.trigger_kind,
                    status = %task.status,
                    articles = task.total_articles,
                    flagged = task.total_flagged,
                    started = %task.started_at,
                    "Task"
                );
            }
            Ok(())
        }
    }
}

/// Run the schedule driver until a shutdown signal arrives.
async fn serve(db: Database, runner: Arc<CampaignRunner>, config: &Config) -> Result<()> {
    info!("Starting mediascan");

    if let Some(schedule) = db::get_schedule(db.pool()).await? {
        info!(
            cadence = %schedule.cadence,
            enabled = schedule.enabled,
            next_run = schedule.next_run_at.as_deref().unwrap_or("-"),
            "Schedule loaded"
        );
    } else {
        info!("No schedule configured; driver will idle until one is set");
    }

    let driver = ScheduleDriver::new(
        db,
        runner,
        config.schedule_poll_interval,
        config.campaign_timeout,
    );

    let cancel = CancellationToken::new();
    let driver_cancel = cancel.clone();
    let driver_handle = tokio::spawn(async move {
        driver.run(driver_cancel).await;
    });

    shutdown_signal().await;
    info!("Shutting down...");

    cancel.cancel();
    let _ = driver_handle.await;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mediascan=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
