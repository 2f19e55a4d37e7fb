pub mod client;
pub mod context;
pub mod probe;
pub mod provider;
pub mod results;
pub mod schema;
pub mod zap;

pub use client::EngineClient;
pub use provider::EngineApi;
pub use schema::{ActiveScanRequest, AlertQuery, RawAlert};
pub use zap::ZapEngine;
