//! Camera parameters and viewport geometry.
//!
//! Depth follows the wgpu convention: normalized device depth runs from 0 at
//! the near plane to 1 at the far plane. Display coordinates are in pixels
//! with the origin at the top-left corner of the viewport.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Projection model of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraProjection {
    /// Perspective projection with a vertical field of view in radians.
    Perspective { fov_y: f32 },
    /// Parallel projection; `scale` is half the viewport height in world units.
    Parallel { scale: f32 },
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, 1.0 for degenerate viewports.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Returns true if the pixel coordinate lies inside the viewport.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }

    /// Geometric mean of width and height, used as "screen size".
    pub fn screen_size(&self) -> f32 {
        ((self.width as f32) * (self.height as f32)).sqrt()
    }
}

/// A world position projected to the display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    pub x: f32,
    pub y: f32,
    /// Normalized device depth.
    pub depth: f32,
}

/// Camera state at the time of a render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub position: Vec3,
    pub focal_point: Vec3,
    pub view_up: Vec3,
    pub projection: CameraProjection,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Y,
            projection: CameraProjection::Perspective {
                fov_y: 30f32.to_radians(),
            },
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraParams {
    /// Creates a perspective camera looking at `focal_point`.
    pub fn look_at(position: Vec3, focal_point: Vec3, view_up: Vec3) -> Self {
        Self {
            position,
            focal_point,
            view_up,
            ..Default::default()
        }
    }

    /// Sets the projection model.
    pub fn with_projection(mut self, projection: CameraProjection) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the clipping range.
    pub fn with_clipping_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Unit vector from the camera position toward the focal point.
    pub fn direction_of_projection(&self) -> Vec3 {
        (self.focal_point - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// View-up vector made orthogonal to the view direction.
    pub fn orthogonal_view_up(&self) -> Vec3 {
        let dir = self.direction_of_projection();
        let right = dir.cross(self.view_up).normalize_or(Vec3::X);
        right.cross(dir)
    }

    /// Distance between the camera position and the focal point.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.focal_point)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            CameraProjection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            CameraProjection::Parallel { scale } => Mat4::orthographic_rh(
                -scale * aspect,
                scale * aspect,
                -scale,
                scale,
                self.near,
                self.far,
            ),
        }
    }

    /// Combined view-projection matrix for a viewport.
    pub fn view_projection(&self, viewport: Viewport) -> Mat4 {
        self.projection_matrix(viewport.aspect()) * self.view_matrix()
    }

    /// Distance of `position` from the camera along the view direction.
    pub fn eye_distance(&self, position: Vec3) -> f32 {
        (position - self.position).dot(self.direction_of_projection())
    }

    /// Converts a normalized device depth back to an eye distance.
    pub fn eye_distance_from_depth(&self, depth: f32) -> f32 {
        let (near, far) = (self.near, self.far);
        match self.projection {
            CameraProjection::Perspective { .. } => far * near / (far - depth * (far - near)),
            CameraProjection::Parallel { .. } => near + depth * (far - near),
        }
    }

    /// Projects a world position to display coordinates.
    ///
    /// Returns `None` for positions at or behind the camera plane. Positions
    /// outside the viewport or clipping range are still returned; callers
    /// check the bounds they care about.
    pub fn world_to_display(&self, position: Vec3, viewport: Viewport) -> Option<DisplayPoint> {
        let clip = self.view_projection(viewport) * position.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(DisplayPoint {
            x: (ndc.x * 0.5 + 0.5) * viewport.width as f32,
            y: (0.5 - ndc.y * 0.5) * viewport.height as f32,
            depth: ndc.z,
        })
    }

    /// Builds a world-space ray through a display coordinate.
    ///
    /// Returns the ray origin on the near plane and a unit direction.
    pub fn display_to_ray(&self, x: f32, y: f32, viewport: Viewport) -> (Vec3, Vec3) {
        let ndc_x = 2.0 * x / viewport.width.max(1) as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / viewport.height.max(1) as f32;
        let inv = self.view_projection(viewport).inverse();
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        (near, (far - near).normalize_or(self.direction_of_projection()))
    }

    /// World units covered by one display pixel at `position`.
    ///
    /// Perspective: `2 * d * tan(fov / 2) / height` with `d` the distance along
    /// the view direction (never less than the near plane). Parallel:
    /// `2 * scale / height`.
    pub fn view_scale_factor_at(&self, position: Vec3, viewport: Viewport) -> f32 {
        let height = viewport.height.max(1) as f32;
        match self.projection {
            CameraProjection::Perspective { fov_y } => {
                let d = self.eye_distance(position).max(self.near);
                2.0 * d * (fov_y * 0.5).tan() / height
            }
            CameraProjection::Parallel { scale } => 2.0 * scale / height,
        }
    }
}
