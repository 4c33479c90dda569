//! Observability subsystem.
//!
//! # Responsibilities
//! - Structured logging via tracing (subscriber initialized in main)
//! - Request metrics with a Prometheus exposition endpoint

pub mod metrics;
