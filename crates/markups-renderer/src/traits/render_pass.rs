//! Render pass types and abstractions.

/// Type of render pass, in the order the host issues them every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassType {
    /// Opaque geometry (depth tested, depth written, no blending)
    Opaque,
    /// Translucent geometry (depth tested, alpha blending)
    Transparent,
    /// Overlay pass (labels - rendered on top)
    Overlay,
}

impl PassType {
    /// Returns true if this pass should use depth testing.
    pub fn uses_depth_test(&self) -> bool {
        matches!(self, PassType::Opaque | PassType::Transparent)
    }

    /// Returns true if this pass should write to the depth buffer.
    pub fn writes_depth(&self) -> bool {
        matches!(self, PassType::Opaque)
    }
}

/// Property keys a translucent pass requires of the primitives it draws.
///
/// A primitive is drawn in a keyed pass only if it carries every required
/// key. The empty key set accepts every primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyKeys(u32);

impl PropertyKeys {
    pub const NONE: PropertyKeys = PropertyKeys(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if `self` carries every key in `required`.
    pub fn contains(self, required: PropertyKeys) -> bool {
        self.0 & required.0 == required.0
    }
}
