//! Render primitives and the per-category pipeline set.

mod primitive;
mod set;

pub use primitive::*;
pub use set::*;
