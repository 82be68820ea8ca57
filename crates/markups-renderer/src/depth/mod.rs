//! Depth buffer snapshots and the per-target cache used for occlusion tests.

mod buffer;
mod cache;

pub use buffer::*;
pub use cache::*;
