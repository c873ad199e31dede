//! Human-readable views of engine state.
pub mod listing;

pub use listing::format_listing;
