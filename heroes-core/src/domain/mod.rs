//! Core domain types
//!
//! These types describe heroes exactly as they are stored in the document
//! collection. Field names and timestamp encoding are part of the stored
//! format, so changes here are changes to the persisted documents.

pub mod hero;
