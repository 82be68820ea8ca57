//! Control points and the markup they belong to.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BoundingBox, Category};

/// Where a projected duplicate lies relative to its projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    /// Not a projected duplicate.
    #[default]
    None,
    /// Projected duplicate in front of the plane.
    InFront,
    /// Projected duplicate behind the plane.
    Behind,
}

/// A single interactive 3D handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// World position.
    pub position: Vec3,
    /// Local orientation basis (columns are the local x, y, z axes).
    pub orientation: Mat3,
    /// Display intent. Hidden points are never rendered or picked.
    pub visible: bool,
    pub selected: bool,
    #[serde(default)]
    pub projection: Projection,
    /// Label text, shown next to the glyph when labels are enabled.
    #[serde(default)]
    pub label: String,
}

impl ControlPoint {
    /// Creates a visible, unselected point with an identity frame.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Mat3::IDENTITY,
            visible: true,
            selected: false,
            projection: Projection::None,
            label: String::new(),
        }
    }

    /// Sets the label text.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the selection flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Sets the display intent.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets the local orientation basis.
    pub fn with_orientation(mut self, orientation: Mat3) -> Self {
        self.orientation = orientation;
        self
    }

    /// Marks this point as a projected duplicate.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Derives the category of this point.
    ///
    /// Projection state wins over activity, and activity wins over selection.
    pub fn category(&self, is_active: bool) -> Category {
        match self.projection {
            Projection::InFront => Category::Project,
            Projection::Behind => Category::ProjectBehind,
            Projection::None if is_active => Category::Active,
            Projection::None if self.selected => Category::Selected,
            Projection::None => Category::Unselected,
        }
    }
}

/// Snapshot of a markup as supplied by the data model.
///
/// Point indices are stable and order-significant: index `n` in [`Markup::points`]
/// is control point `n` everywhere in the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markup {
    pub id: Uuid,
    /// Markup name, shown by the name label.
    pub name: String,
    pub points: Vec<ControlPoint>,
    /// Index of the point under interaction, if any.
    #[serde(default)]
    pub active_point: Option<usize>,
    /// Whether the connecting line closes back to the first point.
    #[serde(default)]
    pub closed: bool,
}

impl Markup {
    /// Creates an empty markup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            points: Vec::new(),
            active_point: None,
            closed: false,
        }
    }

    /// Appends a control point and returns its index.
    pub fn add_point(&mut self, point: ControlPoint) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    /// Returns the number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the markup has no control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position used for the markup name label.
    pub fn label_position(&self) -> Option<Vec3> {
        self.points.iter().find(|p| p.visible).map(|p| p.position)
    }

    /// Bounding box of all visible control points.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.points.iter().filter(|p| p.visible).map(|p| p.position))
    }
}

impl Default for Markup {
    fn default() -> Self {
        Self::new("")
    }
}
