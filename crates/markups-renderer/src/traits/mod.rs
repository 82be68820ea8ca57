//! Traits at the boundary with the host render engine.
//!
//! The renderer never owns a window, device or scene graph. The host engine
//! implements these traits and hands them to the pass entry points.

mod render_pass;
mod render_view;

pub use render_pass::*;
pub use render_view::*;
