//! 3D representation of one markup.
//!
//! Ties the pipeline manager, the interaction picker and the markup name
//! label together and sizes control points for the view being rendered.

use glam::Vec3;
use markups_core::{
    BoundingBox, CameraParams, Category, DisplayState, Markup, RepresentationConfig, Viewport,
};

use crate::depth::SharedDepthBufferCache;
use crate::manager::{PipelineManager, PrimitiveRef};
use crate::picker::{InteractionEvent, InteractionPicker, PickResult};
use crate::pipeline::{LabelEntry, LabelPrimitive, TextProperty};
use crate::target::RenderTargetId;
use crate::traits::{GraphicsResources, PassType, PropertyKeys, RenderView, ScenePicker};
use crate::visibility::Visibility;

/// Renders and hit tests the control points of a markup in 3D views.
pub struct MarkupsRepresentation3D {
    config: RepresentationConfig,
    manager: PipelineManager,
    picker: InteractionPicker,
    display: DisplayState,
    name_label: LabelPrimitive,
    name_visibility: Visibility,
    closed: bool,
    selected: Vec<bool>,
    control_point_size: f32,
    view_scale_factor: f32,
    screen_size: f32,
}

impl MarkupsRepresentation3D {
    /// Creates a representation sharing `cache` with the other
    /// representations of the engine context.
    pub fn new(cache: SharedDepthBufferCache, config: RepresentationConfig) -> Self {
        let unselected = config.styles[Category::Unselected];
        let name_label = LabelPrimitive::new(TextProperty {
            color: unselected.color,
            opacity: unselected.opacity,
            background_opacity: unselected.text_background_opacity,
            font_size: unselected.font_size,
        });
        let display = DisplayState::default();

        Self {
            manager: PipelineManager::new(cache, &config),
            config,
            picker: InteractionPicker::new(),
            control_point_size: display.glyph_size,
            display,
            name_label,
            name_visibility: Visibility::Visible,
            closed: false,
            selected: Vec::new(),
            view_scale_factor: 1.0,
            screen_size: 1.0,
        }
    }

    pub fn config(&self) -> &RepresentationConfig {
        &self.config
    }

    pub fn manager(&self) -> &PipelineManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PipelineManager {
        &mut self.manager
    }

    /// Takes a new snapshot of the data model.
    pub fn update_from_model(&mut self, markup: &Markup, display: &DisplayState) {
        self.display = display.clone();
        self.closed = markup.closed;
        self.selected = markup.points.iter().map(|p| p.selected).collect();

        self.name_label.clear();
        if let Some(position) = markup.label_position()
            && !markup.name.is_empty()
        {
            self.name_label.push(LabelEntry {
                position,
                text: markup.name.clone(),
                point_index: None,
            });
        }
        self.name_label.property.color = display.color;
        self.name_label.property.opacity = display.opacity;

        let size = self.update_control_point_size();
        self.manager.update_all_points_and_labels(markup, display, size);
    }

    /// Recomputes the world units per pixel at the camera focal point.
    pub fn update_view_scale_factor(&mut self, camera: &CameraParams, viewport: Viewport) {
        self.view_scale_factor = camera.view_scale_factor_at(camera.focal_point, viewport);
        self.screen_size = viewport.screen_size();
    }

    /// Recomputes the control point size in world units.
    ///
    /// Relative sizing takes `glyph_scale` percent of the screen size.
    pub fn update_control_point_size(&mut self) -> f32 {
        self.control_point_size = if self.display.use_glyph_scale {
            self.display.glyph_scale / 100.0 * self.screen_size * self.view_scale_factor
        } else {
            self.display.glyph_size
        };
        self.control_point_size
    }

    pub fn control_point_size(&self) -> f32 {
        self.control_point_size
    }

    pub fn view_scale_factor(&self) -> f32 {
        self.view_scale_factor
    }

    pub fn set_render_target(&mut self, target: RenderTargetId) {
        self.manager.set_render_target(target);
    }

    pub fn render_opaque_geometry(&mut self, view: &mut dyn RenderView) -> u32 {
        self.update_view_scale_factor(&view.camera(), view.viewport());
        let size = self.update_control_point_size();
        self.manager.render_opaque_geometry(view, true, size)
    }

    pub fn render_translucent_polygonal_geometry(
        &mut self,
        view: &mut dyn RenderView,
        keys: PropertyKeys,
    ) -> u32 {
        self.manager.render_translucent_polygonal_geometry(view, keys)
    }

    /// Draws point labels and the markup name label.
    pub fn render_overlay(&mut self, view: &mut dyn RenderView) -> u32 {
        let mut drawn = self.manager.render_overlay(view);
        self.update_name_label();
        if self.name_label.is_drawable() {
            drawn += view.draw_labels(PassType::Overlay, &self.name_label);
        }
        drawn
    }

    fn update_name_label(&mut self) {
        self.name_visibility = self
            .name_label
            .labels()
            .first()
            .map_or(Visibility::Visible, |label| {
                self.manager.classify_position(label.position)
            });

        // An occluded anchor styles the label like the occluded duplicates.
        let anchor_occluded = !self.name_visibility.is_drawn_visible();
        let show_occluded = self.display.occluded_visibility && self.display.occluded_opacity > 0.0;
        self.name_label.property.opacity = if anchor_occluded {
            self.display.occluded_opacity
        } else {
            self.display.opacity
        };

        let hidden_by_occlusion = (anchor_occluded && !show_occluded)
            || (self.config.hide_text_if_all_points_occluded && self.manager.all_points_occluded());
        self.name_label.visible = self.display.visible
            && self.display.name_label_visible
            && !self.name_label.is_empty()
            && !hidden_by_occlusion;
    }

    /// Visibility of the name label anchor at the last overlay pass.
    ///
    /// An occluded anchor hides the label unless occluded visibility is
    /// enabled, in which case it is drawn with the occluded opacity.
    pub fn name_label_visibility(&self) -> Visibility {
        self.name_visibility
    }

    pub fn name_label(&self) -> &LabelPrimitive {
        &self.name_label
    }

    pub fn has_translucent_polygonal_geometry(&self) -> bool {
        self.manager.has_translucent_polygonal_geometry()
    }

    /// Every primitive, the name label last.
    pub fn actors(&self) -> Vec<PrimitiveRef<'_>> {
        let mut actors = self.manager.actors();
        actors.push(PrimitiveRef::Labels(&self.name_label));
        actors
    }

    pub fn bounds(&self) -> BoundingBox {
        self.manager.bounds()
    }

    /// Pick tolerance in world units.
    pub fn pick_tolerance_world(&self) -> f32 {
        self.config
            .pick_tolerance_world
            .unwrap_or(self.control_point_size * 0.5)
    }

    /// Whether occluded handles can be picked.
    pub fn set_pick_occluded(&mut self, include_occluded: bool) {
        self.picker.include_occluded = include_occluded;
    }

    /// Hit tests handles, then the connecting line.
    pub fn can_interact(&self, event: &InteractionEvent) -> PickResult {
        self.picker
            .can_interact(&self.manager, self.closed, event, self.pick_tolerance_world())
    }

    /// Exact pick, rejected when the hit is hidden in the current frame's
    /// depth snapshot.
    pub fn accurate_pick(&self, picker: &mut dyn ScenePicker, x: f32, y: f32) -> Option<Vec3> {
        self.picker.accurate_pick(
            picker,
            x,
            y,
            self.manager.frame_snapshot(),
            self.config.depth_epsilon,
        )
    }

    /// Returns true if control point `n` was visible at the last render.
    pub fn nth_control_point_view_visibility(&self, n: usize) -> bool {
        self.selected
            .get(n)
            .is_some_and(|&selected| self.manager.nth_control_point_view_visibility(n, selected))
    }

    pub fn occluded_relative_offset(&self) -> f64 {
        self.manager.occluded_relative_offset()
    }

    pub fn set_occluded_relative_offset(&mut self, offset: f64) {
        self.manager.set_occluded_relative_offset(offset);
        self.config.occluded_relative_offset = self.manager.occluded_relative_offset();
    }

    /// Releases every primitive's resources on the target, the name label
    /// included.
    pub fn release_graphics_resources(&mut self, resources: &mut dyn GraphicsResources) -> usize {
        let released = self.manager.release_graphics_resources(resources);
        if released == 0 {
            return 0;
        }
        resources.release(self.name_label.id);
        released + 1
    }
}
