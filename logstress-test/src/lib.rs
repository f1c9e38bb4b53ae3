//! Test utilities for the log stress harness.
//!
//! This crate provides in-memory stand-ins for the external collaborators of a stress run, so
//! that orchestration can be tested without touching the filesystem. See the modules for all
//! available utilities.

pub mod probe;
pub mod sink;
pub mod tracing;
