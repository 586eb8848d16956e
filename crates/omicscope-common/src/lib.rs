//! omicscope-common - Shared types and errors used across all OmicScope crates.

pub mod error;
pub mod language;

pub use error::{OmicError, Result};
pub use language::Language;
