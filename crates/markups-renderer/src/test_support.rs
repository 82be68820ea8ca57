//! Fake host engine for unit tests.

use glam::Vec3;
use markups_core::{CameraParams, Viewport};

use crate::depth::{DepthBuffer, DepthSnapshot, SharedDepthBufferCache};
use crate::gpu::{GlyphInstance, glyph_depth_state};
use crate::pipeline::{GlyphPrimitive, LabelEntry, LabelPrimitive};
use crate::target::{PrimitiveId, RenderTargetId};
use crate::traits::{GraphicsResources, PassType, RenderView, ScenePicker};

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "markups_renderer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Render view with a synthetic depth buffer that records draw calls.
///
/// Occluders are planes perpendicular to the z axis covering the whole
/// viewport, so tests should keep the camera on the z axis when using them.
pub struct FakeView {
    target: RenderTargetId,
    frame: u64,
    camera: CameraParams,
    viewport: Viewport,
    occluders: Vec<f32>,
    pub depth_reads: usize,
    pub drawn_glyphs: Vec<(PassType, Vec<GlyphInstance>)>,
    /// Depth state a wgpu host would bind for each glyph draw.
    pub glyph_depth_states: Vec<Option<wgpu::DepthStencilState>>,
    pub drawn_labels: Vec<(PassType, Vec<LabelEntry>)>,
    draws: Vec<PassType>,
}

impl FakeView {
    pub fn new() -> Self {
        Self {
            target: RenderTargetId::new(),
            frame: 0,
            camera: CameraParams::default(),
            viewport: Viewport::new(200, 200),
            occluders: Vec::new(),
            depth_reads: 0,
            drawn_glyphs: Vec::new(),
            glyph_depth_states: Vec::new(),
            drawn_labels: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// Adds an opaque plane at world `z`.
    pub fn with_plane(mut self, z: f32) -> Self {
        self.occluders.push(z);
        self
    }

    pub fn with_camera(mut self, camera: CameraParams) -> Self {
        self.camera = camera;
        self
    }

    pub fn clear_occluders(&mut self) {
        self.occluders.clear();
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Completes the current frame: the cache entry goes stale.
    pub fn next_frame(&mut self, cache: &SharedDepthBufferCache) {
        cache.invalidate(self.target);
        self.advance_frame();
    }

    pub fn camera_params(&self) -> CameraParams {
        self.camera
    }

    pub fn viewport_size(&self) -> Viewport {
        self.viewport
    }

    /// Pass of every draw call, in call order.
    pub fn passes(&self) -> Vec<PassType> {
        self.draws.clone()
    }
}

impl RenderView for FakeView {
    fn target(&self) -> RenderTargetId {
        self.target
    }

    fn frame(&self) -> u64 {
        self.frame
    }

    fn camera(&self) -> CameraParams {
        self.camera
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn read_depth_buffer(&mut self) -> Option<DepthSnapshot> {
        self.depth_reads += 1;
        let mut buffer = DepthBuffer::cleared(self.viewport.width, self.viewport.height);
        for &z in &self.occluders {
            let on_plane = Vec3::new(self.camera.focal_point.x, self.camera.focal_point.y, z);
            if let Some(projected) = self.camera.world_to_display(on_plane, self.viewport)
                && projected.depth > 0.0
                && projected.depth < 1.0
            {
                buffer.fill_rect(0, 0, self.viewport.width, self.viewport.height, projected.depth);
            }
        }
        Some(DepthSnapshot::new(buffer, self.camera))
    }

    fn draw_glyphs(&mut self, pass: PassType, primitive: &GlyphPrimitive) -> u32 {
        self.draws.push(pass);
        self.drawn_glyphs.push((pass, primitive.instances().to_vec()));
        self.glyph_depth_states.push(glyph_depth_state(
            pass,
            primitive,
            wgpu::TextureFormat::Depth32Float,
        ));
        primitive.len() as u32
    }

    fn draw_labels(&mut self, pass: PassType, primitive: &LabelPrimitive) -> u32 {
        self.draws.push(pass);
        self.drawn_labels.push((pass, primitive.labels().to_vec()));
        primitive.len() as u32
    }
}

/// Records released primitives.
pub struct FakeResources {
    target: RenderTargetId,
    pub released: Vec<PrimitiveId>,
}

impl FakeResources {
    pub fn new(target: RenderTargetId) -> Self {
        Self {
            target,
            released: Vec::new(),
        }
    }
}

impl GraphicsResources for FakeResources {
    fn target(&self) -> RenderTargetId {
        self.target
    }

    fn release(&mut self, primitive: PrimitiveId) {
        self.released.push(primitive);
    }
}

/// Scene picker returning a fixed hit.
pub struct FakePicker {
    hit: Option<Vec3>,
}

impl FakePicker {
    pub fn new(hit: Option<Vec3>) -> Self {
        Self { hit }
    }
}

impl ScenePicker for FakePicker {
    fn pick(&mut self, _x: f32, _y: f32) -> Option<Vec3> {
        self.hit
    }
}
