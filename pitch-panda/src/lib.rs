//! Startup due-diligence: crawl a company website, read its pitch deck and
//! private notes, and turn them into a structured analysis and memo.

pub mod cli;
pub mod config;
pub mod deck;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod schemas;
pub mod scraper;
pub mod store;
pub mod utils;
