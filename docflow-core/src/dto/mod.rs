//! Data Transfer Objects for the REST APIs
//!
//! This module contains the request and response shapes exchanged with the
//! pipeline service that are not domain records themselves: the response
//! envelope, list filters, search bodies and job handles.

pub mod envelope;
pub mod llm_model;
pub mod onboarding;
pub mod pipeline;
pub mod profile;
