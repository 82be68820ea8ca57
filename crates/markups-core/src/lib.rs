//! Markups Core Data Structures
//!
//! This crate contains the data model consumed by the markups renderer:
//! - Category: the closed set of control point display categories
//! - ControlPoint / Markup: positions, frames, flags and labels
//! - DisplayState: display styling supplied alongside the markup
//! - CameraParams / Viewport: camera and viewport geometry
//! - RepresentationConfig: tunables, loadable from RON

pub mod config;
pub mod display;
pub mod types;

pub use config::*;
pub use display::*;
pub use types::*;
