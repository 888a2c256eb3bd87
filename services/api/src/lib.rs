//! Eventsphere API
//!
//! REST backend for publishing events and booking tickets. Runs either on a
//! seeded in-memory store with demo tokens, or on PostgreSQL with signed JWTs.

pub mod booking;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod policy;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod seed;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
