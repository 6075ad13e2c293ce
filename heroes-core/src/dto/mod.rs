//! Data Transfer Objects
//!
//! Inputs accepted by the hero repository and the shape of its list output.

pub mod hero;
pub mod paging;
