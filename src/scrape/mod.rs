//! Scraping orchestration: per-source fallback collection, the multi-source
//! campaign runner, the periodic schedule driver, and the trigger surface
//! consumed by the (external) HTTP layer.

pub mod campaign;
pub mod collector;
pub mod scheduler;
pub mod service;

pub use campaign::{
    CampaignOptions, CampaignRunner, CampaignScope, CampaignSummary, ModerationOutcome,
    SourceResult,
};
pub use collector::{CollectMethod, CollectOutcome, SourceCollector};
pub use scheduler::{schedule_is_due, ScheduleDriver};
pub use service::{ScrapeService, TriggerParams};
