//! Occlusion classification of control points against a depth snapshot.

use glam::Vec3;

use crate::depth::DepthSnapshot;

/// Result of classifying one control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Nothing nearer at the point's projection.
    #[default]
    Visible,
    /// Other geometry is nearer, or the point lies outside the clipping range.
    Occluded,
    /// The point projects outside the viewport (or behind the camera).
    OutOfView,
}

impl Visibility {
    /// Returns true if the point is drawn with the visible style.
    ///
    /// Out-of-view points stay in the visible set; the rasterizer clips them.
    pub fn is_drawn_visible(self) -> bool {
        matches!(self, Visibility::Visible | Visibility::OutOfView)
    }

    /// Returns true if the point can be picked.
    pub fn is_interactive(self) -> bool {
        self == Visibility::Visible
    }
}

/// Classifies points as visible or occluded.
///
/// A point at eye distance `e` whose projection hits a stored depth at eye
/// distance `s` is visible iff `e - tolerance_world <= s * (1 + epsilon)`.
/// The comparison is done in linear eye space so the tolerance means the
/// same thing at every distance. `tolerance_world` absorbs occlusion of the
/// point by its own glyph; `epsilon` absorbs depth quantization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityClassifier {
    epsilon: f32,
    tolerance_world: f32,
}

impl VisibilityClassifier {
    pub const DEFAULT_EPSILON: f32 = 1e-3;

    pub fn new(epsilon: f32, tolerance_world: f32) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
            tolerance_world: tolerance_world.max(0.0),
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn tolerance_world(&self) -> f32 {
        self.tolerance_world
    }

    pub fn set_tolerance_world(&mut self, tolerance: f32) {
        self.tolerance_world = tolerance.max(0.0);
    }

    /// Classifies one world position.
    ///
    /// Without a snapshot every point is visible.
    pub fn classify(&self, position: Vec3, snapshot: Option<&DepthSnapshot>) -> Visibility {
        let Some(snapshot) = snapshot else {
            return Visibility::Visible;
        };
        let camera = &snapshot.camera;
        let viewport = snapshot.viewport();

        let Some(projected) = camera.world_to_display(position, viewport) else {
            return Visibility::OutOfView;
        };
        if !viewport.contains(projected.x, projected.y) {
            return Visibility::OutOfView;
        }
        // At or beyond a clip plane. The eye distance test keeps points that
        // round onto a clip plane from slipping through the depth test.
        let distance = camera.eye_distance(position);
        if projected.depth <= 0.0
            || projected.depth >= 1.0
            || distance <= camera.near * (1.0 + self.epsilon)
            || distance >= camera.far * (1.0 - self.epsilon)
        {
            return Visibility::Occluded;
        }

        let Some(stored) = snapshot
            .buffer
            .depth_at(projected.x as u32, projected.y as u32)
        else {
            return Visibility::OutOfView;
        };

        let point_distance = camera.eye_distance_from_depth(projected.depth);
        let stored_distance = camera.eye_distance_from_depth(stored.clamp(0.0, 1.0));
        if point_distance - self.tolerance_world <= stored_distance * (1.0 + self.epsilon) {
            Visibility::Visible
        } else {
            Visibility::Occluded
        }
    }
}

impl Default for VisibilityClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON, 0.0)
    }
}
