//! Glyph orientation relative to the camera.

use glam::{Mat3, Quat, Vec3};
use markups_core::{CameraParams, GlyphType};

/// Orientation of a single glyph.
///
/// 3D glyphs follow the control point's own frame. 2D glyphs are billboards:
/// their x axis points to the camera's right, y along the view-up vector and
/// z back toward the camera.
pub fn glyph_orientation(basis: Mat3, camera: &CameraParams, glyph: GlyphType) -> Quat {
    if glyph.is_3d() {
        orthonormalize(basis).map_or(Quat::IDENTITY, |frame| Quat::from_mat3(&frame).normalize())
    } else {
        camera_facing(camera)
    }
}

/// Rotation of a billboard facing the camera.
pub fn camera_facing(camera: &CameraParams) -> Quat {
    let back = -camera.direction_of_projection();
    let up = camera.orthogonal_view_up();
    let right = up.cross(back);
    Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
}

/// Gram-Schmidt orthonormalization of a right-handed frame. Returns `None`
/// for degenerate frames.
fn orthonormalize(basis: Mat3) -> Option<Mat3> {
    let x = basis.x_axis.try_normalize()?;
    let y = (basis.y_axis - x * x.dot(basis.y_axis)).try_normalize()?;
    let z = x.cross(y);
    // Keep the frame right-handed even if the input was mirrored.
    Some(Mat3::from_cols(x, y, z))
}

/// Keeps per-point glyph orientations in step with the camera.
///
/// The output array is indexed exactly like the input point array.
#[derive(Debug, Clone, Default)]
pub struct OrientationUpdater {
    last_camera: Option<(Vec3, Vec3, Vec3)>,
    last_glyph: Option<GlyphType>,
}

impl OrientationUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the camera or glyph type changed since the last update.
    pub fn needs_update(&self, camera: &CameraParams, glyph: GlyphType) -> bool {
        self.last_camera != Some(camera_key(camera)) || self.last_glyph != Some(glyph)
    }

    /// Recomputes the orientation of every basis into `out`.
    pub fn update<'a>(
        &mut self,
        bases: impl IntoIterator<Item = &'a Mat3>,
        camera: &CameraParams,
        glyph: GlyphType,
        out: &mut Vec<Quat>,
    ) {
        out.clear();
        out.extend(
            bases
                .into_iter()
                .map(|basis| glyph_orientation(*basis, camera, glyph)),
        );
        self.last_camera = Some(camera_key(camera));
        self.last_glyph = Some(glyph);
    }

    /// Forgets the last camera so the next check reports a change.
    pub fn reset(&mut self) {
        self.last_camera = None;
        self.last_glyph = None;
    }
}

fn camera_key(camera: &CameraParams) -> (Vec3, Vec3, Vec3) {
    (camera.position, camera.focal_point, camera.view_up)
}
