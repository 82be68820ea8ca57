//! Glyph and label render primitives.

use glam::{Quat, Vec3};
use markups_core::GlyphType;

use crate::coincident::CoincidentTopologyOffsets;
use crate::gpu::GlyphInstance;
use crate::target::PrimitiveId;
use crate::traits::PropertyKeys;

/// Surface appearance of a glyph primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProperty {
    pub color: [f32; 3],
    pub opacity: f32,
}

impl SurfaceProperty {
    pub fn rgba(&self) -> [f32; 4] {
        [self.color[0], self.color[1], self.color[2], self.opacity]
    }
}

/// Appearance of a label primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextProperty {
    pub color: [f32; 3],
    pub opacity: f32,
    pub background_opacity: f32,
    pub font_size: u32,
}

/// A set of glyphs drawn with one mapper and one property.
#[derive(Debug, Clone)]
pub struct GlyphPrimitive {
    pub id: PrimitiveId,
    pub glyph: GlyphType,
    /// Glyph size in world units.
    pub scale: f32,
    pub property: SurfaceProperty,
    pub offsets: CoincidentTopologyOffsets,
    /// Keys a keyed translucent pass can filter on.
    pub keys: PropertyKeys,
    pub visible: bool,
    instances: Vec<GlyphInstance>,
    point_indices: Vec<usize>,
}

impl GlyphPrimitive {
    pub fn new(property: SurfaceProperty, offsets: CoincidentTopologyOffsets) -> Self {
        Self {
            id: PrimitiveId::new(),
            glyph: GlyphType::Sphere3D,
            scale: 1.0,
            property,
            offsets,
            keys: PropertyKeys::NONE,
            visible: false,
            instances: Vec::new(),
            point_indices: Vec::new(),
        }
    }

    /// Adds a glyph for control point `index`.
    pub fn push(&mut self, index: usize, position: Vec3, orientation: Quat) {
        self.instances.push(GlyphInstance::new(
            position,
            self.scale,
            orientation,
            self.property.rgba(),
        ));
        self.point_indices.push(index);
    }

    /// Removes every glyph.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.point_indices.clear();
    }

    pub fn instances(&self) -> &[GlyphInstance] {
        &self.instances
    }

    /// Control point index of each instance, in instance order.
    pub fn point_indices(&self) -> &[usize] {
        &self.point_indices
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns true if a draw call would produce anything.
    pub fn is_drawable(&self) -> bool {
        self.visible && !self.instances.is_empty() && self.property.opacity > 0.0
    }

    /// Returns true if the primitive belongs to the translucent pass.
    pub fn is_translucent(&self) -> bool {
        self.property.opacity < 1.0
    }

    /// Sets the glyph size of existing and future instances.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        for instance in &mut self.instances {
            instance.scale = scale;
        }
    }

    /// Sets the surface property and re-tints existing instances.
    pub fn set_property(&mut self, property: SurfaceProperty) {
        self.property = property;
        let rgba = property.rgba();
        for instance in &mut self.instances {
            instance.color = rgba;
        }
    }
}

/// A single label anchored in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    pub position: Vec3,
    pub text: String,
    /// Control point the label belongs to, `None` for the markup name.
    pub point_index: Option<usize>,
}

/// A set of labels laid out by the host's label placement.
#[derive(Debug, Clone)]
pub struct LabelPrimitive {
    pub id: PrimitiveId,
    pub property: TextProperty,
    pub visible: bool,
    labels: Vec<LabelEntry>,
}

impl LabelPrimitive {
    pub fn new(property: TextProperty) -> Self {
        Self {
            id: PrimitiveId::new(),
            property,
            visible: false,
            labels: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: LabelEntry) {
        self.labels.push(entry);
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn labels(&self) -> &[LabelEntry] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns true if a draw call would produce anything.
    pub fn is_drawable(&self) -> bool {
        self.visible && !self.labels.is_empty() && self.property.opacity > 0.0
    }
}
