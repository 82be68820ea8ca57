//! Core type definitions

mod bounds;
mod camera;
mod category;
mod control_point;

pub use bounds::*;
pub use camera::*;
pub use category::*;
pub use control_point::*;
