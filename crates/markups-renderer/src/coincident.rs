//! Coincident topology depth offsets.
//!
//! Visible-style and occluded-style glyphs of the same point sit at the same
//! depth. The occluded-style primitives get a relative depth offset so the
//! two never z-fight. Offsets are given in resolvable depth units: positive
//! values move primitives away from the camera, negative values toward it.

use markups_core::{DEFAULT_OCCLUDED_RELATIVE_OFFSET, clamp_relative_offset};

/// Smallest resolvable difference of a 24-bit depth buffer.
pub const DEPTH_RESOLUTION: f32 = 1.0 / 16_777_216.0;

/// Polygon-offset style parameters: `offset = factor * slope + units * r`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetParameters {
    pub factor: f32,
    pub units: f32,
}

impl OffsetParameters {
    pub const fn new(factor: f32, units: f32) -> Self {
        Self { factor, units }
    }

    /// Applies the offset to a normalized depth. `slope` is the maximum
    /// depth slope of the primitive in window space.
    pub fn resolve(&self, depth: f32, slope: f32) -> f32 {
        depth + self.factor * slope + self.units * DEPTH_RESOLUTION
    }
}

/// Depth offsets of one mapper, set independently per topology.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoincidentTopologyOffsets {
    pub lines: OffsetParameters,
    pub polygons: OffsetParameters,
    pub points: f32,
}

impl CoincidentTopologyOffsets {
    /// No offset at all.
    pub const NONE: CoincidentTopologyOffsets = CoincidentTopologyOffsets {
        lines: OffsetParameters::new(0.0, 0.0),
        polygons: OffsetParameters::new(0.0, 0.0),
        points: 0.0,
    };

    /// Offsets of the visible-style glyph mappers.
    pub const PRIMARY: CoincidentTopologyOffsets = CoincidentTopologyOffsets {
        lines: OffsetParameters::new(0.0, -1.0),
        polygons: OffsetParameters::new(0.0, -1.0),
        points: -1.0,
    };
}

/// Applies the occluded relative offset to the occluded-style mapper.
///
/// The occluded offsets become the primary offsets shifted by
/// `relative_offset` units on lines, polygons and points. The primary
/// offsets are left untouched. Must be reapplied whenever mappers are
/// recreated.
pub fn apply_relative_offset(
    primary: &CoincidentTopologyOffsets,
    occluded: &mut CoincidentTopologyOffsets,
    relative_offset: f64,
) {
    let offset = clamp_relative_offset(relative_offset) as f32;
    occluded.lines = OffsetParameters::new(primary.lines.factor, primary.lines.units + offset);
    occluded.polygons =
        OffsetParameters::new(primary.polygons.factor, primary.polygons.units + offset);
    occluded.points = primary.points + offset;
}

/// Offsets of an occluded-style mapper with the default relative offset.
pub fn default_occluded_offsets() -> CoincidentTopologyOffsets {
    let mut occluded = CoincidentTopologyOffsets::NONE;
    apply_relative_offset(
        &CoincidentTopologyOffsets::PRIMARY,
        &mut occluded,
        DEFAULT_OCCLUDED_RELATIVE_OFFSET,
    );
    occluded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets() {
        let occluded = default_occluded_offsets();
        assert_eq!(occluded.polygons, OffsetParameters::new(0.0, -25001.0));
        assert_eq!(occluded.lines, OffsetParameters::new(0.0, -25001.0));
        assert_eq!(occluded.points, -25001.0);
    }

    #[test]
    fn test_primary_is_not_modified() {
        let primary = CoincidentTopologyOffsets::PRIMARY;
        let mut occluded = CoincidentTopologyOffsets::NONE;
        apply_relative_offset(&primary, &mut occluded, 100.0);
        assert_eq!(primary, CoincidentTopologyOffsets::PRIMARY);
        assert_eq!(occluded.points, 99.0);
    }

    #[test]
    fn test_offset_is_clamped() {
        let mut occluded = CoincidentTopologyOffsets::NONE;
        apply_relative_offset(&CoincidentTopologyOffsets::NONE, &mut occluded, 1.0e6);
        assert_eq!(occluded.polygons.units, 65000.0);
    }

    #[test]
    fn test_depth_ordering_is_stable_across_frames() {
        let primary = CoincidentTopologyOffsets::PRIMARY;
        for relative in [-65000.0, -25000.0, -10.0, 10.0, 25000.0, 65000.0] {
            let mut occluded = CoincidentTopologyOffsets::NONE;
            apply_relative_offset(&primary, &mut occluded, relative);

            let mut outcomes = Vec::new();
            for frame in 0..32 {
                // Same world position every frame; slope varies with the view.
                let depth = 0.25 + frame as f32 * 0.02;
                let slope = (frame % 5) as f32 * 1e-4;
                let visible = primary.polygons.resolve(depth, slope);
                let hidden = occluded.polygons.resolve(depth, slope);
                outcomes.push(hidden < visible);
            }
            let expected = relative < 0.0;
            assert!(
                outcomes.iter().all(|&nearer| nearer == expected),
                "relative offset {relative} flickered"
            );
        }
    }
}
