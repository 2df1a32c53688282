pub mod analysis;
pub mod api;
pub mod battle;
pub mod clash_api;
pub mod config;
pub mod locale;
pub mod metrics;
