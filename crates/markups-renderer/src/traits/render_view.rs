//! Render view, resource and picking traits implemented by the host engine.

use glam::Vec3;
use markups_core::{CameraParams, Viewport};

use super::PassType;
use crate::depth::DepthSnapshot;
use crate::pipeline::{GlyphPrimitive, LabelPrimitive};
use crate::target::{PrimitiveId, RenderTargetId};

/// The render target a pass is executed for.
///
/// All camera and viewport context reaches the renderer through this trait;
/// nothing is read back from an owning object.
pub trait RenderView {
    /// Identity of the render target.
    fn target(&self) -> RenderTargetId;

    /// Frame counter of the render target. Passes with the same value belong
    /// to the same frame.
    fn frame(&self) -> u64;

    /// Camera used for the current frame.
    fn camera(&self) -> CameraParams;

    /// Viewport size in pixels.
    fn viewport(&self) -> Viewport;

    /// Reads back the depth buffer of the last completed render, together
    /// with the camera it was rendered with.
    fn read_depth_buffer(&mut self) -> Option<DepthSnapshot>;

    /// Draws a glyph primitive and returns the number of glyphs drawn.
    fn draw_glyphs(&mut self, pass: PassType, primitive: &GlyphPrimitive) -> u32;

    /// Draws a label primitive and returns the number of labels drawn.
    fn draw_labels(&mut self, pass: PassType, primitive: &LabelPrimitive) -> u32;
}

/// Graphics resources held by a render target on behalf of primitives.
pub trait GraphicsResources {
    /// Identity of the render target owning the resources.
    fn target(&self) -> RenderTargetId;

    /// Frees the resources of one primitive.
    fn release(&mut self, primitive: PrimitiveId);
}

/// Exact geometric picker of the host scene.
pub trait ScenePicker {
    /// Picks scene geometry at a display coordinate and returns the world
    /// position of the hit.
    fn pick(&mut self, x: f32, y: f32) -> Option<Vec3>;
}
