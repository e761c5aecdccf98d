//! # Response Processing
//!
//! Turns XML payloads returned by the service into plain nested data.

pub mod normalize;

// Re-export main items for convenience
pub use normalize::{normalize, AttributeBag, Node, ATTRIBUTES_KEY, TEXT_KEY};
