// Common library for the dataflow refresh service

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod etl;
pub mod metadata;
pub mod models;
pub mod scheduler;
pub mod telemetry;
