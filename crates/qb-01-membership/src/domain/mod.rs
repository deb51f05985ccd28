//! # Domain Module
//!
//! Group entity, membership variants and errors.

pub mod errors;
pub mod group;

pub use errors::*;
pub use group::*;
