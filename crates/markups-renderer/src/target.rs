//! Identities of render targets and render primitives.

use uuid::Uuid;

/// Identity of a render target (a renderer/viewport pair of the host engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(Uuid);

impl RenderTargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RenderTargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RenderTargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a render primitive (glyph set or label set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId(Uuid);

impl PrimitiveId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrimitiveId {
    fn default() -> Self {
        Self::new()
    }
}
