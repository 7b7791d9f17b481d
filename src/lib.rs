//! Roster API Library
//!
//! This library provides the core functionality for the Roster API: agent
//! and mission tracking with availability derived from active missions,
//! the document store adapters, and the HTTP layer.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod seed;
