//! Coordinate types for world-pixel and map-cell positions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Absolute map-cell coordinate (world pixels divided by the cell size).
///
/// Cell coordinates are global and time-independent: the same cell always
/// refers to the same patch of the world, which is what makes
/// coordinate-seeded generation and cache reuse possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct CellCoord {
    /// X coordinate in cell space
    pub x: i64,
    /// Y coordinate in cell space
    pub y: i64,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Converts a world-pixel position to the cell containing it.
    ///
    /// Uses floor semantics so negative pixel positions map to the correct
    /// cell (pixel -1.0 is in cell -1, not cell 0).
    #[must_use]
    pub fn from_pixels(x: f32, y: f32, cell_size: u32) -> Self {
        let size = f64::from(cell_size);
        Self {
            x: (f64::from(x) / size).floor() as i64,
            y: (f64::from(y) / size).floor() as i64,
        }
    }

    /// Returns the world-pixel position of this cell's origin corner.
    #[must_use]
    pub fn origin_pixels(self, cell_size: u32) -> (f32, f32) {
        let size = i64::from(cell_size);
        ((self.x * size) as f32, (self.y * size) as f32)
    }

    /// Returns the world-pixel position of this cell's center.
    #[must_use]
    pub fn center_pixels(self, cell_size: u32) -> (f32, f32) {
        let (ox, oy) = self.origin_pixels(cell_size);
        let half = cell_size as f32 / 2.0;
        (ox + half, oy + half)
    }

    /// Offsets the coordinate by whole cells.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_positive() {
        assert_eq!(CellCoord::from_pixels(0.0, 0.0, 256), CellCoord::new(0, 0));
        assert_eq!(
            CellCoord::from_pixels(255.9, 255.9, 256),
            CellCoord::new(0, 0)
        );
        assert_eq!(
            CellCoord::from_pixels(256.0, 512.0, 256),
            CellCoord::new(1, 2)
        );
    }

    #[test]
    fn test_from_pixels_negative_floors() {
        assert_eq!(
            CellCoord::from_pixels(-0.5, -256.0, 256),
            CellCoord::new(-1, -1)
        );
        assert_eq!(
            CellCoord::from_pixels(-256.5, -257.0, 256),
            CellCoord::new(-2, -2)
        );
    }

    #[test]
    fn test_origin_and_center() {
        let cell = CellCoord::new(-3, 2);
        assert_eq!(cell.origin_pixels(256), (-768.0, 512.0));
        assert_eq!(cell.center_pixels(256), (-640.0, 640.0));
    }

    #[test]
    fn test_offset() {
        assert_eq!(CellCoord::new(4, -4).offset(-1, 2), CellCoord::new(3, -2));
    }

    proptest::proptest! {
        #[test]
        fn prop_pixel_always_inside_its_cell(
            x in -1_000_000.0f32..1_000_000.0,
            y in -1_000_000.0f32..1_000_000.0,
        ) {
            let cell = CellCoord::from_pixels(x, y, 256);
            let (ox, oy) = cell.origin_pixels(256);
            proptest::prop_assert!(ox <= x && x < ox + 256.0);
            proptest::prop_assert!(oy <= y && y < oy + 256.0);
        }
    }
}
