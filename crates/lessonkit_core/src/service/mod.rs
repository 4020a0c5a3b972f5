//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into lesson lifecycle APIs.
//! - Keep hosts decoupled from storage details.

pub mod autosave;
pub mod lesson_service;
