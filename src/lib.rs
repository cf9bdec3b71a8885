//! salvus-build library exports.
//!
//! The binary is a thin CLI over these modules; integration tests use them
//! directly.

pub mod component;
pub mod config;
pub mod error;
pub mod extract;
pub mod preflight;
pub mod process;
pub mod timing;

pub use error::{Error, Result};
