// Fixed-delay polling with an on-demand trigger

pub mod config;
pub mod errors;
pub mod scheduler;
pub mod telemetry;
