//! Infrastructure Layer
//!
//! Client handles for external services, built from settings:
//! - Database pool (PostgreSQL)
//! - Cache client (Redis)

pub mod cache;
pub mod database;
