//! Display styling supplied by the data model together with a markup.

use serde::{Deserialize, Serialize};

/// Glyph used to draw control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GlyphType {
    /// Shaded sphere aligned with the control point frame.
    #[default]
    Sphere3D,
    Circle2D,
    Cross2D,
    Diamond2D,
    Square2D,
    StarBurst2D,
    Triangle2D,
    Vertex2D,
}

impl GlyphType {
    /// Returns true for glyphs with real 3D geometry.
    pub fn is_3d(self) -> bool {
        matches!(self, GlyphType::Sphere3D)
    }
}

/// Display state of a markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Whether the markup is shown in this view at all.
    pub visible: bool,
    pub glyph_type: GlyphType,
    /// Size glyphs relative to the screen instead of in world units.
    pub use_glyph_scale: bool,
    /// Relative glyph size, percent of the screen size.
    pub glyph_scale: f32,
    /// Absolute glyph size in world units.
    pub glyph_size: f32,
    pub point_labels_visible: bool,
    /// Whether the markup name label is shown.
    pub name_label_visible: bool,
    /// Draw occluded points through occluding geometry.
    pub occluded_visibility: bool,
    pub occluded_opacity: f32,
    pub opacity: f32,
    /// Multiplier applied to the base font size.
    pub text_scale: f32,
    pub color: [f32; 3],
    pub selected_color: [f32; 3],
    pub active_color: [f32; 3],
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            visible: true,
            glyph_type: GlyphType::Sphere3D,
            use_glyph_scale: true,
            glyph_scale: 3.0,
            glyph_size: 5.0,
            point_labels_visible: true,
            name_label_visible: true,
            occluded_visibility: false,
            occluded_opacity: 0.3,
            opacity: 1.0,
            text_scale: 1.0,
            color: [0.4, 1.0, 1.0],
            selected_color: [1.0, 0.5, 0.5],
            active_color: [0.4, 1.0, 0.0],
        }
    }
}

impl DisplayState {
    /// Returns the display state with occluded duplicates enabled.
    pub fn with_occluded_visibility(mut self, opacity: f32) -> Self {
        self.occluded_visibility = true;
        self.occluded_opacity = opacity;
        self
    }

    /// Returns the display state using an absolute glyph size.
    pub fn with_glyph_size(mut self, size: f32) -> Self {
        self.use_glyph_scale = false;
        self.glyph_size = size;
        self
    }
}
