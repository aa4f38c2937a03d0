//! Docflow Core
//!
//! Core types and editing logic for the document-processing pipeline service.
//!
//! This crate contains:
//! - Domain types: pipelines, tasks, LLM model records, profiles, onboarding jobs
//! - DTOs: request/response shapes for the REST APIs
//! - Graph derivation for rendering a pipeline's task flow
//! - The task editor's merge-update contract and client-side validation
//! - The transcription widget's wire protocol

pub mod domain;
pub mod dto;
pub mod editor;
pub mod graph;
pub mod transcription;
pub mod validation;
