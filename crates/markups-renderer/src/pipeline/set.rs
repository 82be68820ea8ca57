//! Per-category control point pipelines.

use glam::{Mat3, Quat, Vec3};
use markups_core::{CameraParams, Category, CategoryMap, CategoryStyle, GlyphType};

use super::{GlyphPrimitive, LabelEntry, LabelPrimitive, SurfaceProperty, TextProperty};
use crate::coincident::{CoincidentTopologyOffsets, apply_relative_offset};
use crate::depth::DepthSnapshot;
use crate::orientation::OrientationUpdater;
use crate::target::PrimitiveId;
use crate::visibility::{Visibility, VisibilityClassifier};

/// One control point as seen by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEntry {
    /// Control point index in the markup.
    pub index: usize,
    pub position: Vec3,
    pub basis: Mat3,
    pub label: String,
}

/// Glyph, occluded glyph, label and occluded label primitives of one category.
///
/// `entries`, `orientations` and `visibility` are parallel arrays: element
/// `i` of each describes the same control point.
#[derive(Debug, Clone)]
pub struct ControlPointsPipeline {
    pub category: Category,
    pub glyphs: GlyphPrimitive,
    pub occluded_glyphs: GlyphPrimitive,
    pub labels: LabelPrimitive,
    pub occluded_labels: LabelPrimitive,
    entries: Vec<PipelineEntry>,
    orientations: Vec<Quat>,
    visibility: Vec<Visibility>,
}

/// The fixed set of pipelines, one per category.
pub type PipelineSet = CategoryMap<ControlPointsPipeline>;

impl ControlPointsPipeline {
    /// Creates an empty pipeline styled for `category`.
    pub fn new(category: Category, style: &CategoryStyle, occluded_relative_offset: f64) -> Self {
        let primary = CoincidentTopologyOffsets::PRIMARY;
        let mut occluded = CoincidentTopologyOffsets::NONE;
        apply_relative_offset(&primary, &mut occluded, occluded_relative_offset);

        let text = |opacity: f32, background_opacity: f32| TextProperty {
            color: style.color,
            opacity,
            background_opacity,
            font_size: style.font_size,
        };

        Self {
            category,
            glyphs: GlyphPrimitive::new(
                SurfaceProperty {
                    color: style.color,
                    opacity: style.opacity,
                },
                primary,
            ),
            occluded_glyphs: GlyphPrimitive::new(
                SurfaceProperty {
                    color: style.color,
                    opacity: style.occluded_opacity,
                },
                occluded,
            ),
            labels: LabelPrimitive::new(text(style.opacity, style.text_background_opacity)),
            occluded_labels: LabelPrimitive::new(text(
                style.occluded_opacity,
                style.occluded_text_background_opacity,
            )),
            entries: Vec::new(),
            orientations: Vec::new(),
            visibility: Vec::new(),
        }
    }

    /// Replaces the points of this category.
    ///
    /// Orientations reset to identity until the next orientation update.
    /// Each point keeps the visibility `previous` reports for its control
    /// point index until the next classification; unknown points start
    /// visible.
    pub fn set_entries(
        &mut self,
        entries: Vec<PipelineEntry>,
        previous: impl Fn(usize) -> Option<Visibility>,
    ) {
        self.orientations = vec![Quat::IDENTITY; entries.len()];
        self.visibility = entries
            .iter()
            .map(|entry| previous(entry.index).unwrap_or(Visibility::Visible))
            .collect();
        self.entries = entries;
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn orientations(&self) -> &[Quat] {
        &self.orientations
    }

    pub fn visibility(&self) -> &[Visibility] {
        &self.visibility
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(entry, visibility)` pairs.
    pub fn classified_entries(&self) -> impl Iterator<Item = (&PipelineEntry, Visibility)> {
        self.entries.iter().zip(self.visibility.iter().copied())
    }

    /// Visibility of control point `index`, if it belongs to this category.
    pub fn visibility_of(&self, index: usize) -> Option<Visibility> {
        self.classified_entries()
            .find(|(entry, _)| entry.index == index)
            .map(|(_, visibility)| visibility)
    }

    /// Recomputes glyph orientations for the camera.
    pub fn update_orientations(
        &mut self,
        updater: &mut OrientationUpdater,
        camera: &CameraParams,
        glyph: GlyphType,
    ) {
        updater.update(
            self.entries.iter().map(|entry| &entry.basis),
            camera,
            glyph,
            &mut self.orientations,
        );
    }

    /// Classifies every point against a depth snapshot.
    pub fn classify(&mut self, classifier: &VisibilityClassifier, snapshot: Option<&DepthSnapshot>) {
        self.visibility.clear();
        self.visibility.extend(
            self.entries
                .iter()
                .map(|entry| classifier.classify(entry.position, snapshot)),
        );
    }

    /// Marks every point visible.
    pub fn set_all_visible(&mut self) {
        self.visibility.iter_mut().for_each(|v| *v = Visibility::Visible);
    }

    /// Rebuilds the four primitives from the current classification.
    ///
    /// Primitives of an empty category are hidden, never dropped.
    pub fn rebuild_primitives(&mut self, show_labels: bool, show_occluded: bool) {
        self.glyphs.clear();
        self.occluded_glyphs.clear();
        self.labels.clear();
        self.occluded_labels.clear();

        for ((entry, orientation), visibility) in self
            .entries
            .iter()
            .zip(&self.orientations)
            .zip(&self.visibility)
        {
            let (glyphs, labels) = if visibility.is_drawn_visible() {
                (&mut self.glyphs, &mut self.labels)
            } else {
                (&mut self.occluded_glyphs, &mut self.occluded_labels)
            };
            glyphs.push(entry.index, entry.position, *orientation);
            if show_labels && !entry.label.is_empty() {
                labels.push(LabelEntry {
                    position: entry.position,
                    text: entry.label.clone(),
                    point_index: Some(entry.index),
                });
            }
        }

        self.glyphs.visible = !self.glyphs.is_empty();
        self.occluded_glyphs.visible = show_occluded && !self.occluded_glyphs.is_empty();
        self.labels.visible = show_labels && !self.labels.is_empty();
        self.occluded_labels.visible =
            show_labels && show_occluded && !self.occluded_labels.is_empty();
    }

    /// Ids of the four primitives.
    pub fn primitive_ids(&self) -> [PrimitiveId; 4] {
        [
            self.glyphs.id,
            self.occluded_glyphs.id,
            self.labels.id,
            self.occluded_labels.id,
        ]
    }

    /// Sets the color of glyphs, occluded glyphs and both label sets.
    pub fn set_color(&mut self, color: [f32; 3]) {
        for glyphs in [&mut self.glyphs, &mut self.occluded_glyphs] {
            let property = SurfaceProperty {
                color,
                ..glyphs.property
            };
            glyphs.set_property(property);
        }
        self.labels.property.color = color;
        self.occluded_labels.property.color = color;
    }

    /// Sets the opacity of visible glyphs and labels.
    pub fn set_opacity(&mut self, opacity: f32, text_background_opacity: f32) {
        let property = SurfaceProperty {
            opacity,
            ..self.glyphs.property
        };
        self.glyphs.set_property(property);
        self.labels.property.opacity = opacity;
        self.labels.property.background_opacity = text_background_opacity;
    }

    /// Sets the opacity of occluded glyphs and labels.
    pub fn set_occluded_opacity(&mut self, opacity: f32, text_background_opacity: f32) {
        let property = SurfaceProperty {
            opacity,
            ..self.occluded_glyphs.property
        };
        self.occluded_glyphs.set_property(property);
        self.occluded_labels.property.opacity = opacity;
        self.occluded_labels.property.background_opacity = text_background_opacity;
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.labels.property.font_size = size;
        self.occluded_labels.property.font_size = size;
    }

    pub fn set_glyph_type(&mut self, glyph: GlyphType) {
        self.glyphs.glyph = glyph;
        self.occluded_glyphs.glyph = glyph;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.glyphs.set_scale(scale);
        self.occluded_glyphs.set_scale(scale);
    }

    /// Reapplies coincident topology offsets to both glyph mappers.
    pub fn set_occluded_relative_offset(&mut self, relative_offset: f64) {
        self.glyphs.offsets = CoincidentTopologyOffsets::PRIMARY;
        apply_relative_offset(
            &self.glyphs.offsets,
            &mut self.occluded_glyphs.offsets,
            relative_offset,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, x: f32, label: &str) -> PipelineEntry {
        PipelineEntry {
            index,
            position: Vec3::new(x, 0.0, 0.0),
            basis: Mat3::IDENTITY,
            label: label.to_string(),
        }
    }

    fn pipeline() -> ControlPointsPipeline {
        ControlPointsPipeline::new(
            Category::Unselected,
            &CategoryStyle::for_category(Category::Unselected),
            -25000.0,
        )
    }

    #[test]
    fn test_parallel_arrays_follow_entries() {
        let mut pipeline = pipeline();
        pipeline.set_entries(vec![entry(0, 0.0, "a"), entry(3, 1.0, "b")], |_| None);
        assert_eq!(pipeline.orientations().len(), 2);
        assert_eq!(pipeline.visibility().len(), 2);
        assert_eq!(pipeline.visibility_of(3), Some(Visibility::Visible));
        assert_eq!(pipeline.visibility_of(1), None);
    }

    #[test]
    fn test_set_entries_keeps_previous_visibility() {
        let mut pipeline = pipeline();
        pipeline.set_entries(vec![entry(0, 0.0, "a"), entry(4, 1.0, "b")], |index| {
            (index == 4).then_some(Visibility::Occluded)
        });
        assert_eq!(pipeline.visibility_of(0), Some(Visibility::Visible));
        assert_eq!(pipeline.visibility_of(4), Some(Visibility::Occluded));
        assert_eq!(pipeline.orientations(), &[Quat::IDENTITY, Quat::IDENTITY]);
    }

    #[test]
    fn test_rebuild_partitions_points() {
        let mut pipeline = pipeline();
        pipeline.set_entries(
            vec![entry(0, 0.0, "a"), entry(1, 1.0, ""), entry(2, 2.0, "c")],
            |_| None,
        );
        pipeline.visibility = vec![Visibility::Visible, Visibility::Occluded, Visibility::Occluded];

        pipeline.rebuild_primitives(true, true);
        assert_eq!(pipeline.glyphs.point_indices(), &[0]);
        assert_eq!(pipeline.occluded_glyphs.point_indices(), &[1, 2]);
        assert_eq!(pipeline.labels.len(), 1);
        // Empty label text produces no label.
        assert_eq!(pipeline.occluded_labels.len(), 1);
        assert!(pipeline.occluded_glyphs.visible);

        pipeline.rebuild_primitives(false, false);
        assert!(!pipeline.occluded_glyphs.visible);
        assert!(!pipeline.labels.visible);
        assert_eq!(pipeline.occluded_glyphs.len(), 2);
    }

    #[test]
    fn test_empty_category_is_hidden_not_absent() {
        let mut pipeline = pipeline();
        pipeline.rebuild_primitives(true, true);
        assert!(!pipeline.glyphs.visible);
        assert!(pipeline.glyphs.is_empty());
        assert_eq!(pipeline.primitive_ids().len(), 4);
    }

    #[test]
    fn test_style_setters() {
        let mut pipeline = pipeline();
        pipeline.set_color([0.1, 0.2, 0.3]);
        pipeline.set_opacity(0.5, 0.25);
        pipeline.set_occluded_opacity(0.2, 0.1);
        pipeline.set_font_size(30);

        assert_eq!(pipeline.glyphs.property.color, [0.1, 0.2, 0.3]);
        assert_eq!(pipeline.occluded_glyphs.property.color, [0.1, 0.2, 0.3]);
        assert_eq!(pipeline.glyphs.property.opacity, 0.5);
        assert_eq!(pipeline.labels.property.background_opacity, 0.25);
        assert_eq!(pipeline.occluded_glyphs.property.opacity, 0.2);
        assert_eq!(pipeline.occluded_labels.property.font_size, 30);
    }

    #[test]
    fn test_relative_offset_only_touches_occluded_mapper() {
        let mut pipeline = pipeline();
        pipeline.set_occluded_relative_offset(500.0);
        assert_eq!(pipeline.glyphs.offsets, CoincidentTopologyOffsets::PRIMARY);
        assert_eq!(pipeline.occluded_glyphs.offsets.points, 499.0);
    }
}
