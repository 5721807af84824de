// Frameworks layer: runtime wiring and environment configuration.

pub mod client;
pub mod config;
