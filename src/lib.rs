pub mod config;
pub mod delta;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod overview;
pub mod period;
pub mod ranking;
pub mod refresh;
pub mod sources;
