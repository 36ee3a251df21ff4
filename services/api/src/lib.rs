//! services/api/src/lib.rs
//!
//! The learning path service: configuration, adapters for the core ports and
//! the HTTP surface. The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
