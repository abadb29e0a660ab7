//! Shared utility functions.

pub mod urls;

pub use urls::{extract_domain, normalize_domain};
