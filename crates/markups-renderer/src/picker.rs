//! Interaction hit testing against rendered control points and lines.
//!
//! Tolerances are given in world units and converted to pixels with the view
//! scale factor at the tested position, so a handle keeps the same world-size
//! pick radius at every zoom level.

use glam::{Vec2, Vec3};
use markups_core::{CameraParams, Category, Viewport};

use crate::depth::DepthSnapshot;
use crate::manager::PipelineManager;
use crate::traits::ScenePicker;
use crate::visibility::Visibility;

/// Kind of component an interaction event hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    /// Nothing was hit.
    #[default]
    None,
    ControlPoint,
    /// Segment of the connecting line; the index is the segment's first point.
    Line,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub component: ComponentType,
    /// Category of the hit control point.
    pub category: Option<Category>,
    /// Control point index (or first point of the hit segment).
    pub index: Option<usize>,
    /// Squared display distance in pixels.
    pub distance2: f32,
}

impl PickResult {
    /// No hit.
    pub const NONE: PickResult = PickResult {
        component: ComponentType::None,
        category: None,
        index: None,
        distance2: f32::MAX,
    };

    pub fn is_hit(&self) -> bool {
        self.component != ComponentType::None
    }
}

impl Default for PickResult {
    fn default() -> Self {
        Self::NONE
    }
}

/// Display position of an interaction event with the view it happened in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionEvent {
    /// Pixel position, origin at the top-left corner.
    pub display_position: Vec2,
    pub camera: CameraParams,
    pub viewport: Viewport,
}

impl InteractionEvent {
    pub fn new(display_position: Vec2, camera: CameraParams, viewport: Viewport) -> Self {
        Self {
            display_position,
            camera,
            viewport,
        }
    }

    fn project(&self, position: Vec3) -> Option<Vec2> {
        self.camera
            .world_to_display(position, self.viewport)
            .map(|p| Vec2::new(p.x, p.y))
    }

    /// Pick tolerance in pixels for a world tolerance at `position`.
    fn tolerance_pixels(&self, tolerance_world: f32, position: Vec3) -> f32 {
        let scale = self.camera.view_scale_factor_at(position, self.viewport);
        if scale > f32::EPSILON {
            tolerance_world / scale
        } else {
            0.0
        }
    }
}

/// Hit tests handles and connecting lines of one representation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionPicker {
    /// Also consider occluded handles.
    pub include_occluded: bool,
}

impl InteractionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    fn pickable(&self, visibility: Visibility) -> bool {
        visibility.is_interactive() || (self.include_occluded && visibility == Visibility::Occluded)
    }

    /// Finds the closest pickable handle within tolerance of the event.
    ///
    /// Only the Unselected, Selected and Active categories hold handles.
    pub fn can_interact_with_handles(
        &self,
        manager: &PipelineManager,
        event: &InteractionEvent,
        tolerance_world: f32,
    ) -> PickResult {
        let mut best = PickResult::NONE;
        for category in Category::PRIMARY {
            for (entry, visibility) in manager.pipeline(category).classified_entries() {
                if !self.pickable(visibility) {
                    continue;
                }
                let Some(display) = event.project(entry.position) else {
                    continue;
                };
                let distance2 = display.distance_squared(event.display_position);
                let tolerance = event.tolerance_pixels(tolerance_world, entry.position);
                if distance2 <= tolerance * tolerance && distance2 < best.distance2 {
                    best = PickResult {
                        component: ComponentType::ControlPoint,
                        category: Some(category),
                        index: Some(entry.index),
                        distance2,
                    };
                }
            }
        }
        best
    }

    /// Tests the connecting line between consecutive handles.
    ///
    /// Handles have priority: a prior control point hit is returned as is.
    /// Otherwise a segment replaces `prior` only if it is closer. A segment is
    /// pickable when both of its points are.
    pub fn can_interact_with_line(
        &self,
        manager: &PipelineManager,
        closed: bool,
        event: &InteractionEvent,
        tolerance_world: f32,
        prior: PickResult,
    ) -> PickResult {
        if prior.component == ComponentType::ControlPoint {
            return prior;
        }

        let mut points: Vec<(usize, Vec3, Visibility)> = Category::PRIMARY
            .into_iter()
            .flat_map(|category| manager.pipeline(category).classified_entries())
            .map(|(entry, visibility)| (entry.index, entry.position, visibility))
            .collect();
        if points.len() < 2 {
            return prior;
        }
        points.sort_by_key(|(index, _, _)| *index);

        let mut segments: Vec<(usize, usize)> = (0..points.len() - 1).map(|i| (i, i + 1)).collect();
        if closed && points.len() > 2 {
            segments.push((points.len() - 1, 0));
        }

        let mut best = prior;
        for (a, b) in segments {
            let (index, start, start_visibility) = points[a];
            let (_, end, end_visibility) = points[b];
            if !self.pickable(start_visibility) || !self.pickable(end_visibility) {
                continue;
            }
            let (Some(p0), Some(p1)) = (event.project(start), event.project(end)) else {
                continue;
            };

            let t = closest_parameter(p0, p1, event.display_position);
            let distance2 = p0.lerp(p1, t).distance_squared(event.display_position);
            let tolerance = event.tolerance_pixels(tolerance_world, start.lerp(end, t));
            if distance2 <= tolerance * tolerance && distance2 < best.distance2 {
                best = PickResult {
                    component: ComponentType::Line,
                    category: None,
                    index: Some(index),
                    distance2,
                };
            }
        }
        best
    }

    /// Handle test followed by the line test.
    pub fn can_interact(
        &self,
        manager: &PipelineManager,
        closed: bool,
        event: &InteractionEvent,
        tolerance_world: f32,
    ) -> PickResult {
        let handles = self.can_interact_with_handles(manager, event, tolerance_world);
        self.can_interact_with_line(manager, closed, event, tolerance_world, handles)
    }

    /// Exact pick through the scene picker.
    ///
    /// With a depth snapshot the hit is returned only if nothing in the
    /// snapshot lies nearer at the hit's projection. Hits projecting outside
    /// the snapshot's viewport are rejected.
    pub fn accurate_pick(
        &self,
        picker: &mut dyn ScenePicker,
        x: f32,
        y: f32,
        snapshot: Option<&DepthSnapshot>,
        epsilon: f32,
    ) -> Option<Vec3> {
        let hit = picker.pick(x, y)?;
        let Some(snapshot) = snapshot else {
            return Some(hit);
        };

        let camera = &snapshot.camera;
        let viewport = snapshot.viewport();
        let projected = camera.world_to_display(hit, viewport)?;
        if !viewport.contains(projected.x, projected.y) {
            return None;
        }
        let stored = snapshot
            .buffer
            .depth_at(projected.x as u32, projected.y as u32)?;
        let hit_distance = camera.eye_distance_from_depth(projected.depth.clamp(0.0, 1.0));
        let stored_distance = camera.eye_distance_from_depth(stored.clamp(0.0, 1.0));
        (hit_distance <= stored_distance * (1.0 + epsilon)).then_some(hit)
    }
}

/// Parameter in [0, 1] of the point on segment `p0 p1` closest to `q`.
fn closest_parameter(p0: Vec2, p1: Vec2, q: Vec2) -> f32 {
    let d = p1 - p0;
    let length2 = d.length_squared();
    if length2 <= f32::EPSILON {
        return 0.0;
    }
    ((q - p0).dot(d) / length2).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use markups_core::{ControlPoint, DisplayState, Markup, RepresentationConfig};

    use super::*;
    use crate::depth::{DepthBuffer, SharedDepthBufferCache};
    use crate::test_support::{FakePicker, FakeView};

    fn classified(markup: &Markup, view: &mut FakeView) -> PipelineManager {
        let mut manager =
            PipelineManager::new(SharedDepthBufferCache::new(), &RepresentationConfig::default());
        manager.update_all_points_and_labels(markup, &DisplayState::default(), 0.2);
        manager.render_opaque_geometry(view, false, 0.0);
        manager
    }

    fn event_at(view: &FakeView, position: Vec3) -> InteractionEvent {
        let camera = view.camera_params();
        let viewport = view.viewport_size();
        let display = camera.world_to_display(position, viewport).unwrap();
        InteractionEvent::new(Vec2::new(display.x, display.y), camera, viewport)
    }

    #[test]
    fn test_hit_visible_handle() {
        let mut markup = Markup::new("F");
        markup.add_point(ControlPoint::new(Vec3::new(-1.0, 0.0, 0.0)));
        markup.add_point(ControlPoint::new(Vec3::new(1.0, 0.0, 0.0)));
        let mut view = FakeView::new();
        let manager = classified(&markup, &mut view);

        let result = InteractionPicker::new().can_interact_with_handles(
            &manager,
            &event_at(&view, Vec3::new(1.0, 0.0, 0.0)),
            0.5,
        );
        assert_eq!(result.component, ComponentType::ControlPoint);
        assert_eq!(result.category, Some(Category::Unselected));
        assert_eq!(result.index, Some(1));
        assert!(result.distance2 < 1e-3);
    }

    #[test]
    fn test_occluded_handle_is_never_returned() {
        let mut markup = Markup::new("F");
        // Both points project to the display center; only the front one is visible.
        markup.add_point(ControlPoint::new(Vec3::new(0.0, 0.0, -3.0)));
        markup.add_point(ControlPoint::new(Vec3::new(0.0, 0.0, 2.0)));
        let mut view = FakeView::new().with_plane(-1.0);
        let manager = classified(&markup, &mut view);
        let event = event_at(&view, Vec3::ZERO);

        let result = InteractionPicker::new().can_interact_with_handles(&manager, &event, 0.5);
        assert_eq!(result.index, Some(1));

        let mut hidden_only = Markup::new("F");
        hidden_only.add_point(ControlPoint::new(Vec3::new(0.0, 0.0, -3.0)));
        let mut view = FakeView::new().with_plane(-1.0);
        let manager = classified(&hidden_only, &mut view);
        let picker = InteractionPicker::new();
        assert!(!picker.can_interact_with_handles(&manager, &event, 0.5).is_hit());

        let overriding = InteractionPicker {
            include_occluded: true,
        };
        assert_eq!(
            overriding.can_interact_with_handles(&manager, &event, 0.5).index,
            Some(0)
        );
    }

    #[test]
    fn test_off_viewport_handle_is_never_picked() {
        let off_screen = Vec3::new(100.0, 0.0, 0.0);
        let mut markup = Markup::new("F");
        markup.add_point(ControlPoint::new(off_screen));
        let mut view = FakeView::new().with_plane(-5.0);
        let manager = classified(&markup, &mut view);
        assert!(!manager.nth_control_point_view_visibility(0, false));

        let event = event_at(&view, off_screen);
        for include_occluded in [false, true] {
            let picker = InteractionPicker { include_occluded };
            assert!(!picker.can_interact_with_handles(&manager, &event, 1.0).is_hit());
            assert!(!picker.can_interact(&manager, false, &event, 1.0).is_hit());
        }
    }

    #[test]
    fn test_tolerance_scales_with_zoom() {
        let mut markup = Markup::new("F");
        markup.add_point(ControlPoint::new(Vec3::ZERO));

        let mut previous_radius = f32::MAX;
        for distance in [2.0, 5.0, 10.0, 40.0, 200.0] {
            let camera = CameraParams::look_at(Vec3::new(0.0, 0.0, distance), Vec3::ZERO, Vec3::Y);
            let mut view = FakeView::new().with_camera(camera);
            let manager = classified(&markup, &mut view);
            let center = event_at(&view, Vec3::ZERO);

            // Largest pixel offset that still hits.
            let mut radius = 0.0;
            for offset in 0..400 {
                let event = InteractionEvent {
                    display_position: center.display_position + Vec2::new(offset as f32 * 0.5, 0.0),
                    ..center
                };
                if InteractionPicker::new()
                    .can_interact_with_handles(&manager, &event, 0.25)
                    .is_hit()
                {
                    radius = offset as f32 * 0.5;
                }
            }
            assert!(radius < previous_radius, "radius {radius} at distance {distance}");
            previous_radius = radius;
        }
    }

    #[test]
    fn test_line_hit_only_without_handle_hit() {
        let mut markup = Markup::new("L");
        markup.add_point(ControlPoint::new(Vec3::new(-2.0, 0.0, 0.0)));
        markup.add_point(ControlPoint::new(Vec3::new(2.0, 0.0, 0.0)));
        let mut view = FakeView::new();
        let manager = classified(&markup, &mut view);
        let picker = InteractionPicker::new();

        let middle = event_at(&view, Vec3::ZERO);
        let result = picker.can_interact(&manager, false, &middle, 0.2);
        assert_eq!(result.component, ComponentType::Line);
        assert_eq!(result.index, Some(0));

        let on_handle = event_at(&view, Vec3::new(2.0, 0.0, 0.0));
        let result = picker.can_interact(&manager, false, &on_handle, 0.2);
        assert_eq!(result.component, ComponentType::ControlPoint);
        assert_eq!(result.index, Some(1));
    }

    #[test]
    fn test_closing_segment_of_closed_curve() {
        let mut markup = Markup::new("C");
        markup.add_point(ControlPoint::new(Vec3::new(-2.0, -1.0, 0.0)));
        markup.add_point(ControlPoint::new(Vec3::new(2.0, -1.0, 0.0)));
        markup.add_point(ControlPoint::new(Vec3::new(0.0, 2.0, 0.0)));
        let mut view = FakeView::new();
        let manager = classified(&markup, &mut view);
        let picker = InteractionPicker::new();

        // Midpoint of the segment from the last point back to the first.
        let event = event_at(&view, Vec3::new(-1.0, 0.5, 0.0));
        assert!(!picker.can_interact(&manager, false, &event, 0.2).is_hit());
        let result = picker.can_interact(&manager, true, &event, 0.2);
        assert_eq!(result.component, ComponentType::Line);
        assert_eq!(result.index, Some(2));
    }

    #[test]
    fn test_accurate_pick_respects_depth() {
        let camera = CameraParams::default();
        let mut buffer = DepthBuffer::cleared(64, 64);
        let plane_depth = camera
            .world_to_display(Vec3::new(0.0, 0.0, 1.0), buffer.viewport())
            .unwrap()
            .depth;
        buffer.fill_rect(0, 0, 64, 64, plane_depth);
        let snapshot = DepthSnapshot::new(buffer, camera);
        let picker = InteractionPicker::new();

        let mut behind = FakePicker::new(Some(Vec3::new(0.0, 0.0, -1.0)));
        assert_eq!(picker.accurate_pick(&mut behind, 32.0, 32.0, Some(&snapshot), 1e-3), None);

        let mut front = FakePicker::new(Some(Vec3::new(0.0, 0.0, 1.0)));
        assert_eq!(
            picker.accurate_pick(&mut front, 32.0, 32.0, Some(&snapshot), 1e-3),
            Some(Vec3::new(0.0, 0.0, 1.0))
        );

        // Projects left of the viewport; no pixel there to test against.
        let mut off_screen = FakePicker::new(Some(Vec3::new(-100.0, 0.0, 1.0)));
        assert_eq!(
            picker.accurate_pick(&mut off_screen, 0.0, 32.0, Some(&snapshot), 1e-3),
            None
        );

        let mut miss = FakePicker::new(None);
        assert_eq!(picker.accurate_pick(&mut miss, 32.0, 32.0, None, 1e-3), None);
        assert!(picker.accurate_pick(&mut behind, 32.0, 32.0, None, 1e-3).is_some());
    }
}
