//! Hireflow usage-quota library
//!
//! Exposes the quota core to the resume-upload and comparison flows and to
//! the internal HTTP server.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
