//! Markups Renderer
//!
//! Occlusion-aware rendering and hit testing of markup control points.
//!
//! # Architecture
//!
//! The renderer does not own a device or a scene graph. The host engine
//! implements the boundary traits and drives the render passes:
//!
//! - [`traits::RenderView`] - Camera, viewport, depth read-back and draw calls of a target
//! - [`depth::SharedDepthBufferCache`] - Depth snapshots per render target, shared per engine context
//! - [`notify::RenderNotifier`] - Render completion events that invalidate the cache
//! - [`manager::PipelineManager`] - Per-category pipelines and the per-frame pass state machine
//! - [`picker::InteractionPicker`] - Handle and line hit testing
//! - [`representation::MarkupsRepresentation3D`] - Owning representation of one markup
//!
//! # Example
//!
//! ```ignore
//! use markups_renderer::{MarkupsRepresentation3D, RenderNotifier, SharedDepthBufferCache};
//!
//! let cache = SharedDepthBufferCache::new();
//! cache.attach(&mut notifier);
//!
//! let mut representation = MarkupsRepresentation3D::new(cache.clone(), config);
//! representation.update_from_model(&markup, &display);
//!
//! // Every frame, in this order
//! representation.render_opaque_geometry(&mut view);
//! representation.render_translucent_polygonal_geometry(&mut view, PropertyKeys::NONE);
//! representation.render_overlay(&mut view);
//! notifier.render_completed(view.target());
//! ```

pub mod coincident;
pub mod depth;
pub mod gpu;
pub mod manager;
pub mod notify;
pub mod orientation;
pub mod picker;
pub mod pipeline;
pub mod representation;
pub mod target;
pub mod traits;
pub mod visibility;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use coincident::{CoincidentTopologyOffsets, OffsetParameters};
pub use depth::{DepthBuffer, DepthBufferCache, DepthSnapshot, SharedDepthBufferCache};
pub use gpu::GlyphInstance;
pub use manager::{FrameStage, PipelineManager, PrimitiveRef};
pub use notify::{RenderEvent, RenderNotifier, SubscriptionId};
pub use orientation::OrientationUpdater;
pub use picker::{ComponentType, InteractionEvent, InteractionPicker, PickResult};
pub use pipeline::{ControlPointsPipeline, GlyphPrimitive, LabelPrimitive, PipelineSet};
pub use representation::MarkupsRepresentation3D;
pub use target::{PrimitiveId, RenderTargetId};
pub use traits::{GraphicsResources, PassType, PropertyKeys, RenderView, ScenePicker};
pub use visibility::{Visibility, VisibilityClassifier};
