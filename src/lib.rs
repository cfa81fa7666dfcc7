pub mod app;
pub mod common;
pub mod config;
pub mod infra;
pub mod logging;
pub mod pipeline;
