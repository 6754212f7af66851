//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and clock reads into use-case level APIs.
//! - Keep CLI/front-end layers decoupled from storage details.

pub mod task_service;
