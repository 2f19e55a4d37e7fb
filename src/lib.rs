pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod relay;
pub mod target;
