//! Heroes Core
//!
//! Core types for the heroes data-access layer.
//!
//! This crate contains:
//! - Domain types: the persisted `Hero` record and its metadata
//! - DTOs: inputs for create/update, list filters, paging and list results

pub mod domain;
pub mod dto;
