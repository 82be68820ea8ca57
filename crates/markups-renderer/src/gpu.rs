//! wgpu-facing data for glyph primitives.
//!
//! Hosts rendering through wgpu upload [`GlyphInstance`] arrays as instance
//! buffers and pick the depth state of each glyph draw with
//! [`glyph_depth_state`].

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

use crate::coincident::CoincidentTopologyOffsets;
use crate::pipeline::GlyphPrimitive;
use crate::traits::PassType;

/// Glyph instance data - passed as vertex instance
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Glyph center in world space.
    pub position: [f32; 3],
    /// Glyph size in world units.
    pub scale: f32,
    /// Glyph orientation quaternion (x, y, z, w).
    pub orientation: [f32; 4],
    /// Glyph color (RGBA).
    pub color: [f32; 4],
}

impl GlyphInstance {
    pub fn new(position: Vec3, scale: f32, orientation: Quat, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            scale,
            orientation: orientation.to_array(),
            color,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Vertex buffer layout: position+scale, orientation, color.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Polygon depth bias equivalent to a mapper's polygon offsets.
pub fn depth_bias_state(offsets: &CoincidentTopologyOffsets) -> wgpu::DepthBiasState {
    wgpu::DepthBiasState {
        constant: offsets.polygons.units.round() as i32,
        slope_scale: offsets.polygons.factor,
        clamp: 0.0,
    }
}

/// Depth state for drawing `primitive` in `pass`.
///
/// Returns `None` for passes without depth testing. Glyphs write depth only
/// in the opaque pass; translucent glyphs, occluded-style ones included,
/// test against it with `LessEqual` so coincident visible glyphs keep
/// their depth.
pub fn glyph_depth_state(
    pass: PassType,
    primitive: &GlyphPrimitive,
    format: wgpu::TextureFormat,
) -> Option<wgpu::DepthStencilState> {
    if !pass.uses_depth_test() {
        return None;
    }
    let writes = pass.writes_depth();
    Some(wgpu::DepthStencilState {
        format,
        depth_write_enabled: writes,
        depth_compare: if writes {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::LessEqual
        },
        stencil: wgpu::StencilState::default(),
        bias: depth_bias_state(&primitive.offsets),
    })
}
