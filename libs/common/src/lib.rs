//! Common library for the Eventsphere services
//!
//! This crate provides shared functionality used across the workspace:
//! database connectivity, the storage error type and page arithmetic.

pub mod database;
pub mod error;
pub mod pagination;
