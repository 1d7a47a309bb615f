//! # CSI Rust Backend
//!
//! Construction schedule intelligence engine.
//!
//! This crate analyzes residential construction project schedules: it
//! validates phase sequencing, detects scheduling conflicts between trades,
//! computes regulatory inspection windows, and proposes trade-sequencing
//! optimizations against the dependency critical path. The backend exposes
//! a REST API via Axum for scheduling frontends.
//!
//! ## Features
//!
//! - **Sequence Validation**: Per-task phase ordering and inspection
//!   prerequisite checks
//! - **Conflict Detection**: Trade overlaps, sequence violations, and
//!   inspection-blocking conflicts with stable signatures
//! - **Inspection Scheduling**: Business-day inspection windows with
//!   one-per-day municipal capacity and manual overrides
//! - **Trade Optimization**: Critical-path analysis with parallel-overlap
//!   and buffer-compression proposals
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain types (phases, tasks, trades, ordering rules)
//! - [`api`]: Derived analysis artifacts returned by engine operations
//! - [`engine`]: The four analyses and the [`engine::ScheduleEngine`] facade
//! - [`db`]: Repository pattern and persistence layer
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod engine;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
