//! jobwire - listing collection and publishing pipeline.
//!
//! Collects job and article listings from Korean web platforms into a shared
//! spreadsheet and publishes curated summaries of eligible rows to Slack,
//! flipping a lifecycle status so each row is published at most once.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod notify;
pub mod scrapers;
pub mod services;
pub mod store;
