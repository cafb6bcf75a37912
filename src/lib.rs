pub mod config;
pub mod diff;
pub mod model;
pub mod report;
pub mod scrape;
pub mod stats;
pub mod store;
pub mod telegram;
