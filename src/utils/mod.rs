//! Shared utility functions.
//!
//! - `format`: Human-readable formatting (ordinals, sizes)

mod format;

pub use format::{format_size, ordinal};
