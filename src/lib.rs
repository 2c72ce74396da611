//! Conversational leave-management assistant.
//!
//! An in-memory leave ledger with a transaction engine, exposed both through
//! direct HTTP endpoints and through a model-driven dialogue loop that calls
//! the same operations as tools.

pub mod api;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod ledger;
pub mod model;
pub mod models;
pub mod policy;
pub mod routes;
pub mod utils;
