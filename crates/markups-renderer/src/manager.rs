//! Control point pipeline manager.
//!
//! Owns the per-category pipeline set and drives it through the render
//! passes of a frame:
//!
//! ```text
//! Idle -> BuildingGeometry -> ClassifyingVisibility -> RenderingOpaque
//!      -> RenderingTranslucent -> RenderingOverlay -> Idle
//! ```
//!
//! Classification happens at most once per frame of a render target; every
//! pass of that frame sees the same visible/occluded partition.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec3;
use markups_core::{
    BoundingBox, CameraParams, Category, CategoryMap, CategoryStyle, DisplayState, GlyphType,
    Markup, RepresentationConfig, clamp_relative_offset,
};

use crate::depth::{DepthSnapshot, SharedDepthBufferCache};
use crate::orientation::OrientationUpdater;
use crate::pipeline::{
    ControlPointsPipeline, GlyphPrimitive, LabelPrimitive, PipelineEntry, PipelineSet,
    SurfaceProperty, TextProperty,
};
use crate::target::RenderTargetId;
use crate::traits::{GraphicsResources, PassType, PropertyKeys, RenderView};
use crate::visibility::{Visibility, VisibilityClassifier};

/// Stage of the per-frame render state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStage {
    #[default]
    Idle,
    BuildingGeometry,
    ClassifyingVisibility,
    RenderingOpaque,
    RenderingTranslucent,
    RenderingOverlay,
}

/// Reference to one renderable primitive.
#[derive(Debug, Clone, Copy)]
pub enum PrimitiveRef<'a> {
    Glyphs(&'a GlyphPrimitive),
    Labels(&'a LabelPrimitive),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameKey {
    target: RenderTargetId,
    frame: u64,
}

/// Manages the five control point pipelines of a 3D markups representation.
pub struct PipelineManager {
    pipelines: PipelineSet,
    base_styles: CategoryMap<CategoryStyle>,
    cache: SharedDepthBufferCache,
    classifier: VisibilityClassifier,
    orientation: OrientationUpdater,
    glyph: GlyphType,
    occluded_relative_offset: f64,
    self_occlusion_factor: f32,
    show_labels: bool,
    show_occluded: bool,
    stage: FrameStage,
    classified_frame: Option<FrameKey>,
    frame_snapshot: Option<Arc<DepthSnapshot>>,
    target: Option<RenderTargetId>,
    used_targets: HashSet<RenderTargetId>,
}

impl PipelineManager {
    /// Creates the manager with one pipeline per category.
    pub fn new(cache: SharedDepthBufferCache, config: &RepresentationConfig) -> Self {
        let offset = clamp_relative_offset(config.occluded_relative_offset);
        let pipelines = PipelineSet::from_fn(|category| {
            ControlPointsPipeline::new(category, &config.styles[category], offset)
        });

        Self {
            pipelines,
            base_styles: config.styles.clone(),
            cache,
            classifier: VisibilityClassifier::new(config.depth_epsilon, 0.0),
            orientation: OrientationUpdater::new(),
            glyph: GlyphType::Sphere3D,
            occluded_relative_offset: offset,
            self_occlusion_factor: config.self_occlusion_factor,
            show_labels: true,
            show_occluded: false,
            stage: FrameStage::Idle,
            classified_frame: None,
            frame_snapshot: None,
            target: None,
            used_targets: HashSet::new(),
        }
    }

    /// Rebuilds the per-category point sets and label text from the model.
    ///
    /// Only mutates primitives; nothing is drawn.
    pub fn update_all_points_and_labels(
        &mut self,
        markup: &Markup,
        display: &DisplayState,
        control_point_size: f32,
    ) {
        self.stage = FrameStage::BuildingGeometry;

        let mut entries: CategoryMap<Vec<PipelineEntry>> = CategoryMap::default();
        if display.visible {
            for (index, point) in markup.points.iter().enumerate() {
                if !point.visible {
                    continue;
                }
                let category = point.category(markup.active_point == Some(index));
                entries[category].push(PipelineEntry {
                    index,
                    position: point.position,
                    basis: point.orientation,
                    label: point.label.clone(),
                });
            }
        }

        self.apply_display_styles(display);
        if self.glyph != display.glyph_type {
            self.set_glyph_type(display.glyph_type);
        }
        self.show_labels = display.point_labels_visible;
        self.show_occluded = display.occluded_visibility && display.occluded_opacity > 0.0;

        // Points keep their last classification until the next render so
        // queries and primitives agree in between.
        let previous: HashMap<usize, Visibility> = self
            .pipelines
            .values()
            .flat_map(|pipeline| pipeline.classified_entries())
            .map(|(entry, visibility)| (entry.index, visibility))
            .collect();
        for (category, points) in entries.iter_mut() {
            let pipeline = &mut self.pipelines[category];
            pipeline.set_entries(std::mem::take(points), |index| previous.get(&index).copied());
            pipeline.rebuild_primitives(self.show_labels, self.show_occluded);
        }
        self.set_control_point_size(control_point_size);

        // New geometry needs fresh orientations and a fresh classification.
        self.orientation.reset();
        self.classified_frame = None;

        tracing::debug!(
            "Rebuilt control point pipelines for markup '{}': {} points",
            markup.name,
            self.point_count()
        );
    }

    fn apply_display_styles(&mut self, display: &DisplayState) {
        for (category, pipeline) in self.pipelines.iter_mut() {
            let base = &self.base_styles[category];
            let color = match category {
                Category::Unselected => display.color,
                Category::Selected => display.selected_color,
                Category::Active => display.active_color,
                Category::Project | Category::ProjectBehind => base.color,
            };
            pipeline.set_color(color);
            pipeline.set_opacity(
                base.opacity * display.opacity,
                base.text_background_opacity * display.opacity,
            );
            pipeline.set_occluded_opacity(
                display.occluded_opacity * display.opacity,
                base.occluded_text_background_opacity * display.opacity,
            );
            pipeline.set_font_size(((base.font_size as f32) * display.text_scale).round() as u32);
        }
    }

    /// Classifies the points for the view's current frame unless that frame
    /// is already classified.
    fn ensure_classified(&mut self, view: &mut dyn RenderView) {
        let key = FrameKey {
            target: view.target(),
            frame: view.frame(),
        };
        if self.classified_frame == Some(key) {
            return;
        }
        self.stage = FrameStage::ClassifyingVisibility;

        let camera = view.camera();
        if self.orientation.needs_update(&camera, self.glyph) {
            self.update_control_point_glyph_orientation(&camera);
        }

        let snapshot = if self.point_count() == 0 {
            None
        } else {
            self.cache
                .get_or_capture(key.target, || view.read_depth_buffer())
        };

        for pipeline in self.pipelines.values_mut() {
            pipeline.classify(&self.classifier, snapshot.as_deref());
            pipeline.rebuild_primitives(self.show_labels, self.show_occluded);
        }

        tracing::trace!(
            "Classified frame {} of {}: {} visible, {} occluded",
            key.frame,
            key.target,
            self.count_where(|v| v.is_drawn_visible()),
            self.count_where(|v| v == Visibility::Occluded)
        );

        self.frame_snapshot = snapshot;
        self.classified_frame = Some(key);
    }

    fn count_where(&self, predicate: impl Fn(Visibility) -> bool) -> usize {
        self.pipelines
            .values()
            .flat_map(|p| p.visibility().iter().copied())
            .filter(|v| predicate(*v))
            .count()
    }

    /// Renders opaque glyphs. Returns the number of glyphs drawn.
    ///
    /// With `update_size` the glyph size is set to `size` first.
    pub fn render_opaque_geometry(
        &mut self,
        view: &mut dyn RenderView,
        update_size: bool,
        size: f32,
    ) -> u32 {
        if update_size {
            self.set_control_point_size(size);
        }
        self.used_targets.insert(view.target());
        self.ensure_classified(view);
        self.stage = FrameStage::RenderingOpaque;

        let mut drawn = 0;
        for pipeline in self.pipelines.values() {
            for glyphs in [&pipeline.glyphs, &pipeline.occluded_glyphs] {
                if glyphs.is_drawable() && !glyphs.is_translucent() {
                    drawn += view.draw_glyphs(PassType::Opaque, glyphs);
                }
            }
        }
        drawn
    }

    /// Renders translucent glyphs carrying every key in `keys`.
    pub fn render_translucent_polygonal_geometry(
        &mut self,
        view: &mut dyn RenderView,
        keys: PropertyKeys,
    ) -> u32 {
        if self.stage != FrameStage::RenderingOpaque {
            tracing::trace!("Translucent pass without a preceding opaque pass");
        }
        self.used_targets.insert(view.target());
        self.ensure_classified(view);
        self.stage = FrameStage::RenderingTranslucent;

        let mut drawn = 0;
        for pipeline in self.pipelines.values() {
            for glyphs in [&pipeline.glyphs, &pipeline.occluded_glyphs] {
                if glyphs.is_drawable() && glyphs.is_translucent() && glyphs.keys.contains(keys) {
                    drawn += view.draw_glyphs(PassType::Transparent, glyphs);
                }
            }
        }
        drawn
    }

    /// Renders point labels. Ends the frame.
    pub fn render_overlay(&mut self, view: &mut dyn RenderView) -> u32 {
        self.used_targets.insert(view.target());
        self.ensure_classified(view);
        self.stage = FrameStage::RenderingOverlay;

        let mut drawn = 0;
        for pipeline in self.pipelines.values() {
            for labels in [&pipeline.labels, &pipeline.occluded_labels] {
                if labels.is_drawable() {
                    drawn += view.draw_labels(PassType::Overlay, labels);
                }
            }
        }
        self.stage = FrameStage::Idle;
        drawn
    }

    /// Returns true if any drawable glyph primitive is translucent.
    pub fn has_translucent_polygonal_geometry(&self) -> bool {
        self.pipelines.values().any(|pipeline| {
            [&pipeline.glyphs, &pipeline.occluded_glyphs]
                .into_iter()
                .any(|glyphs| glyphs.is_drawable() && glyphs.is_translucent())
        })
    }

    /// All primitives of all categories.
    pub fn actors(&self) -> Vec<PrimitiveRef<'_>> {
        self.collect_actors(Category::ALL)
    }

    /// Primitives of the Unselected, Selected and Active categories.
    ///
    /// Projection duplicates are not primary handles and are left out.
    pub fn usa_actors(&self) -> Vec<PrimitiveRef<'_>> {
        self.collect_actors(Category::PRIMARY)
    }

    fn collect_actors<const N: usize>(&self, categories: [Category; N]) -> Vec<PrimitiveRef<'_>> {
        let mut actors = Vec::with_capacity(N * 4);
        for category in categories {
            let pipeline = &self.pipelines[category];
            actors.push(PrimitiveRef::Glyphs(&pipeline.glyphs));
            actors.push(PrimitiveRef::Glyphs(&pipeline.occluded_glyphs));
            actors.push(PrimitiveRef::Labels(&pipeline.labels));
            actors.push(PrimitiveRef::Labels(&pipeline.occluded_labels));
        }
        actors
    }

    /// Returns true if control point `n` was visible at the last
    /// classification. Never reclassifies.
    ///
    /// `is_selected` picks the Selected or Unselected partition; the Active
    /// category is searched in both.
    pub fn nth_control_point_view_visibility(&self, n: usize, is_selected: bool) -> bool {
        let partition = if is_selected {
            Category::Selected
        } else {
            Category::Unselected
        };
        [partition, Category::Active]
            .into_iter()
            .find_map(|category| self.pipelines[category].visibility_of(n))
            .is_some_and(Visibility::is_interactive)
    }

    /// Visibility of an arbitrary position against this frame's snapshot.
    pub fn classify_position(&self, position: Vec3) -> Visibility {
        self.classifier
            .classify(position, self.frame_snapshot.as_deref())
    }

    /// Returns true if there is at least one primary point and none is visible.
    pub fn all_points_occluded(&self) -> bool {
        let mut any = false;
        for category in Category::PRIMARY {
            for visibility in self.pipelines[category].visibility() {
                if visibility.is_drawn_visible() {
                    return false;
                }
                any = true;
            }
        }
        any
    }

    /// Marks every point visible, e.g. when occlusion testing is disabled.
    pub fn set_all_points_visible(&mut self) {
        for pipeline in self.pipelines.values_mut() {
            pipeline.set_all_visible();
            pipeline.rebuild_primitives(self.show_labels, self.show_occluded);
        }
    }

    /// Captures the target's depth buffer now, replacing the cached one.
    pub fn update_depth_buffer(&mut self, view: &mut dyn RenderView) {
        let target = view.target();
        if let Some(snapshot) = view.read_depth_buffer() {
            self.cache.store(target, snapshot);
            self.classified_frame = None;
        }
    }

    /// Recomputes glyph orientations for a camera and refreshes the glyphs.
    pub fn update_control_point_glyph_orientation(&mut self, camera: &CameraParams) {
        for pipeline in self.pipelines.values_mut() {
            pipeline.update_orientations(&mut self.orientation, camera, self.glyph);
            pipeline.rebuild_primitives(self.show_labels, self.show_occluded);
        }
    }

    /// Uses the shaded sphere glyph.
    pub fn set_glyph_3d(&mut self) {
        self.set_glyph_type(GlyphType::Sphere3D);
    }

    /// Uses a camera-facing 2D glyph.
    pub fn set_glyph_2d(&mut self, glyph: GlyphType) {
        if glyph.is_3d() {
            tracing::warn!("{:?} is not a 2D glyph, ignoring", glyph);
            return;
        }
        self.set_glyph_type(glyph);
    }

    fn set_glyph_type(&mut self, glyph: GlyphType) {
        self.glyph = glyph;
        for pipeline in self.pipelines.values_mut() {
            pipeline.set_glyph_type(glyph);
        }
        self.orientation.reset();
        self.classified_frame = None;
    }

    pub fn glyph_type(&self) -> GlyphType {
        self.glyph
    }

    /// Sets the glyph size and the self-occlusion tolerance derived from it.
    pub fn set_control_point_size(&mut self, size: f32) {
        for pipeline in self.pipelines.values_mut() {
            pipeline.set_scale(size);
        }
        self.set_tolerance_world(size * self.self_occlusion_factor);
    }

    /// Sets the self-occlusion tolerance of the classifier.
    pub fn set_tolerance_world(&mut self, tolerance: f32) {
        if self.classifier.tolerance_world() != tolerance {
            self.classifier.set_tolerance_world(tolerance);
            self.classified_frame = None;
        }
    }

    pub fn tolerance_world(&self) -> f32 {
        self.classifier.tolerance_world()
    }

    /// Binds the manager to a render target. Mappers are recreated for a new
    /// target, so coincident offsets are reapplied.
    pub fn set_render_target(&mut self, target: RenderTargetId) {
        if self.target == Some(target) {
            return;
        }
        self.target = Some(target);
        self.reapply_offsets();
        self.classified_frame = None;
        tracing::debug!("Pipeline manager bound to render target {}", target);
    }

    pub fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    pub fn occluded_relative_offset(&self) -> f64 {
        self.occluded_relative_offset
    }

    /// Sets the relative offset of occluded primitives (clamped to ±65000).
    pub fn set_occluded_relative_offset(&mut self, offset: f64) {
        self.occluded_relative_offset = clamp_relative_offset(offset);
        self.reapply_offsets();
    }

    fn reapply_offsets(&mut self) {
        for pipeline in self.pipelines.values_mut() {
            pipeline.set_occluded_relative_offset(self.occluded_relative_offset);
        }
    }

    /// Releases the graphics resources of every primitive on a target.
    ///
    /// Returns the number of primitives released; 0 for targets this manager
    /// never rendered into.
    pub fn release_graphics_resources(&mut self, resources: &mut dyn GraphicsResources) -> usize {
        let target = resources.target();
        if !self.used_targets.remove(&target) {
            tracing::debug!("No graphics resources to release on {}", target);
            return 0;
        }

        let mut released = 0;
        for pipeline in self.pipelines.values() {
            for id in pipeline.primitive_ids() {
                resources.release(id);
                released += 1;
            }
        }
        if self.classified_frame.is_some_and(|key| key.target == target) {
            self.classified_frame = None;
            self.frame_snapshot = None;
        }
        tracing::debug!("Released {} primitives on {}", released, target);
        released
    }

    /// Bounding box of every control point in every category.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(
            self.pipelines
                .values()
                .flat_map(|p| p.entries().iter().map(|e| e.position)),
        )
    }

    pub fn pipeline(&self, category: Category) -> &ControlPointsPipeline {
        &self.pipelines[category]
    }

    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    /// Number of points over all categories.
    pub fn point_count(&self) -> usize {
        self.pipelines.values().map(|p| p.len()).sum()
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Snapshot used by the current frame's classification.
    pub fn frame_snapshot(&self) -> Option<&DepthSnapshot> {
        self.frame_snapshot.as_deref()
    }

    pub fn text_property(&self, category: Category) -> &TextProperty {
        &self.pipelines[category].labels.property
    }

    pub fn property(&self, category: Category) -> &SurfaceProperty {
        &self.pipelines[category].glyphs.property
    }

    pub fn occluded_property(&self, category: Category) -> &SurfaceProperty {
        &self.pipelines[category].occluded_glyphs.property
    }

    /// Sets the color of a category's glyphs, labels and occluded duplicates.
    pub fn set_color(&mut self, category: Category, color: [f32; 3]) {
        self.pipelines[category].set_color(color);
    }

    pub fn set_opacity(&mut self, category: Category, opacity: f32, text_background_opacity: f32) {
        self.pipelines[category].set_opacity(opacity, text_background_opacity);
    }

    pub fn set_occluded_opacity(
        &mut self,
        category: Category,
        opacity: f32,
        text_background_opacity: f32,
    ) {
        self.pipelines[category].set_occluded_opacity(opacity, text_background_opacity);
    }

    pub fn set_font_size(&mut self, category: Category, size: u32) {
        self.pipelines[category].set_font_size(size);
    }
}
