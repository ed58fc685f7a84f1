//! Use-case services sitting between the repository and any front end.
//!
//! # Responsibility
//! - Orchestrate repository calls into user actions with status messages.
//! - Keep front ends decoupled from storage details.

pub mod charts;
pub mod school_service;
