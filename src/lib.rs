//! Mediascan library.
//!
//! A service that monitors a set of media outlets, collecting their articles
//! (RSS with HTML fallback) and social posts (Facebook, Twitter/X),
//! classifying articles into topical categories, scoring content for
//! moderation risk, and computing engagement-based rankings.

pub mod analytics;
pub mod classify;
pub mod config;
pub mod db;
pub mod fetch;
pub mod moderation;
pub mod scrape;
