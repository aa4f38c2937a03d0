//! Core domain types
//!
//! This module contains the records the pipeline service stores and the admin
//! tools edit. They are shared between the HTTP client (which transfers them)
//! and the editing logic in this crate (which derives graphs and merges edits).

pub mod llm_model;
pub mod onboarding;
pub mod pipeline;
pub mod profile;
pub mod task;
