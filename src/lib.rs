//! Discrete-time CPU scheduling simulator.
//!
//! A [`scheduler::Simulator`] drives one [`scheduler::Scheduler`] policy over a
//! fixed workload, one tick at a time, and records when every process started
//! and finished. Workload synthesis, metrics and rendering live beside it.

pub mod config;
pub mod logger;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod workload;
