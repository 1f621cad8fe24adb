//! The `projectdesk` library crate.
//!
//! Contains the domain models, paging and error-classification layers,
//! JWT authentication and route policies, the storage traits with their
//! Postgres and in-memory implementations, the resource services, and
//! the HTTP routing configuration. The binary (`main.rs`) wires these
//! together into a running server.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod paging;
pub mod routes;
pub mod services;
pub mod storage;
