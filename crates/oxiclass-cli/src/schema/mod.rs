pub mod run_config;
pub mod run_summary;
pub mod snapshot;
pub mod tracker;
