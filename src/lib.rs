pub mod clients;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod recorder;
pub mod telemetry;
