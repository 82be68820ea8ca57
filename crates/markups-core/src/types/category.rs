//! Control point categories and the fixed-size per-category table.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Display/interaction category of a control point.
///
/// Every point belongs to exactly one category at a time. The category is
/// derived from selection, active and projection state; it is never stored
/// separately from those flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Unselected,
    Selected,
    Active,
    /// Projection-plane duplicate in front of the plane.
    Project,
    /// Projection-plane duplicate behind the plane.
    ProjectBehind,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// All categories in table order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Unselected,
        Category::Selected,
        Category::Active,
        Category::Project,
        Category::ProjectBehind,
    ];

    /// Categories holding primary handles (Unselected, Selected, Active).
    pub const PRIMARY: [Category; 3] = [Category::Unselected, Category::Selected, Category::Active];

    /// Position of this category in a [`CategoryMap`].
    pub fn index(self) -> usize {
        match self {
            Category::Unselected => 0,
            Category::Selected => 1,
            Category::Active => 2,
            Category::Project => 3,
            Category::ProjectBehind => 4,
        }
    }

    /// Returns true for the categories that represent primary handles.
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            Category::Unselected | Category::Selected | Category::Active
        )
    }

    /// Returns a short name used in logs and labels.
    pub fn name(self) -> &'static str {
        match self {
            Category::Unselected => "Unselected",
            Category::Selected => "Selected",
            Category::Active => "Active",
            Category::Project => "Project",
            Category::ProjectBehind => "ProjectBehind",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size table with exactly one entry per [`Category`].
///
/// The table is sized at compile time and can never grow or shrink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap<T>([T; Category::COUNT]);

impl<T> CategoryMap<T> {
    /// Builds a table by calling `f` once per category, in table order.
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self(std::array::from_fn(|i| f(Category::ALL[i])))
    }

    /// Iterates over `(category, entry)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.0.iter())
    }

    /// Mutable variant of [`CategoryMap::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Category, &mut T)> {
        Category::ALL.into_iter().zip(self.0.iter_mut())
    }

    /// Iterates over the entries only.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Mutable variant of [`CategoryMap::values`].
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.0.iter_mut()
    }

    /// Always [`Category::COUNT`].
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A category map is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<T: Default> Default for CategoryMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.0[category.index()]
    }
}
