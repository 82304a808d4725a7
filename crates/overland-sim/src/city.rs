//! Hand-authored city layouts.
//!
//! Cities are fixed rectangles of tile codes stamped over the procedural
//! wilderness. They anchor the economy (merchants spawn there) and NPC
//! long-term objectives (everyone drifts toward the nearest city).

use crate::grid::CELL_SIZE;
use crate::input::Vec2;
use overland_common::CellCoord;

/// A fixed city block: an origin cell plus an authored tile layout.
///
/// Rows are indexed by cell-y offset from the origin, columns by cell-x
/// offset. Code 0 is a street, nonzero is a building tile.
#[derive(Debug, Clone, Copy)]
pub struct City {
    /// Display name
    pub name: &'static str,
    /// Absolute cell of the layout's top-left corner
    pub origin: CellCoord,
    tiles: &'static [&'static [u8]],
}

impl City {
    /// Layout width in cells.
    #[must_use]
    pub fn width(&self) -> i64 {
        self.tiles.first().map_or(0, |row| row.len() as i64)
    }

    /// Layout height in cells.
    #[must_use]
    pub fn height(&self) -> i64 {
        self.tiles.len() as i64
    }

    /// True if the cell lies inside this city's rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let dx = cell.x - self.origin.x;
        let dy = cell.y - self.origin.y;
        (0..self.width()).contains(&dx) && (0..self.height()).contains(&dy)
    }

    /// The authored tile code at a cell, or `None` outside the rectangle.
    #[must_use]
    pub fn tile_at(&self, cell: CellCoord) -> Option<u8> {
        if !self.contains(cell) {
            return None;
        }
        let dx = (cell.x - self.origin.x) as usize;
        let dy = (cell.y - self.origin.y) as usize;
        Some(self.tiles[dy][dx])
    }

    /// World-pixel center of the city rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        let (ox, oy) = self.origin.origin_pixels(CELL_SIZE);
        let size = CELL_SIZE as f32;
        Vec2::new(
            ox + self.width() as f32 * size / 2.0,
            oy + self.height() as f32 * size / 2.0,
        )
    }
}

/// 9×9 block: shops around two crossing streets.
const CROSSING: &[&[u8]] = &[
    &[1, 1, 0, 2, 2, 0, 3, 3, 4],
    &[1, 1, 0, 2, 2, 0, 3, 3, 4],
    &[0, 0, 0, 0, 0, 0, 0, 0, 0],
    &[4, 5, 0, 6, 6, 0, 7, 7, 1],
    &[4, 5, 0, 6, 6, 0, 0, 0, 1],
    &[0, 0, 0, 0, 0, 0, 0, 0, 0],
    &[8, 8, 0, 9, 9, 0, 1, 2, 3],
    &[8, 8, 0, 9, 9, 0, 1, 2, 3],
    &[0, 0, 0, 0, 0, 0, 0, 0, 0],
];

/// 7×5 strip: a single main street.
const STRIP: &[&[u8]] = &[
    &[6, 7, 0, 8, 8, 0, 9],
    &[6, 7, 0, 8, 8, 0, 9],
    &[0, 0, 0, 0, 0, 0, 0],
    &[2, 2, 0, 3, 0, 4, 4],
    &[2, 2, 0, 3, 0, 4, 4],
];

/// 6×6 block: dense, one alley.
const WARREN: &[&[u8]] = &[
    &[5, 5, 5, 0, 1, 1],
    &[5, 0, 0, 0, 1, 1],
    &[5, 0, 9, 9, 0, 2],
    &[5, 0, 9, 9, 0, 2],
    &[0, 0, 0, 0, 0, 0],
    &[3, 3, 4, 4, 0, 2],
];

/// Every city on the map.
pub const CITIES: &[City] = &[
    City {
        name: "Carvois",
        origin: CellCoord::new(96, -286),
        tiles: CROSSING,
    },
    City {
        name: "Pont-Sec",
        origin: CellCoord::new(148, -242),
        tiles: STRIP,
    },
    City {
        name: "Basse-Fosse",
        origin: CellCoord::new(44, -330),
        tiles: WARREN,
    },
];

/// The authored tile code for a cell, if any city covers it.
#[must_use]
pub fn city_tile_at(cell: CellCoord) -> Option<u8> {
    CITIES.iter().find_map(|city| city.tile_at(cell))
}

/// True if the cell lies inside any city rectangle.
#[must_use]
pub fn in_city(cell: CellCoord) -> bool {
    CITIES.iter().any(|city| city.contains(cell))
}

/// Pixel center of the city nearest to a position.
#[must_use]
pub fn nearest_center(pos: Vec2) -> Vec2 {
    let mut best = CITIES[0].center();
    let mut best_dist = pos.distance(best);
    for city in &CITIES[1..] {
        let center = city.center();
        let dist = pos.distance(center);
        if dist < best_dist {
            best = center;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_rectangular() {
        for city in CITIES {
            assert!(city.height() > 0, "{} is empty", city.name);
            for row in city.tiles {
                assert_eq!(
                    row.len() as i64,
                    city.width(),
                    "{} has ragged rows",
                    city.name
                );
            }
        }
    }

    #[test]
    fn test_tile_lookup_inside_and_outside() {
        let city = &CITIES[0];
        assert_eq!(city.tile_at(city.origin), Some(1));
        assert_eq!(city.tile_at(city.origin.offset(2, 0)), Some(0));
        assert!(city.tile_at(city.origin.offset(-1, 0)).is_none());
        assert!(city.tile_at(city.origin.offset(0, 9)).is_none());
    }

    #[test]
    fn test_cities_do_not_overlap() {
        for (i, a) in CITIES.iter().enumerate() {
            for b in &CITIES[i + 1..] {
                for dy in 0..a.height() {
                    for dx in 0..a.width() {
                        let cell = a.origin.offset(dx, dy);
                        assert!(!b.contains(cell), "{} overlaps {}", a.name, b.name);
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_city_has_streets() {
        // Spawned merchants need walkable cells inside the rectangle.
        for city in CITIES {
            let streets = city
                .tiles
                .iter()
                .flat_map(|row| row.iter())
                .filter(|&&t| t == 0)
                .count();
            assert!(streets > 0, "{} has no streets", city.name);
        }
    }

    #[test]
    fn test_nearest_center() {
        let carvois = CITIES[0].center();
        let near = carvois + Vec2::new(300.0, -500.0);
        assert_eq!(nearest_center(near), carvois);

        let pont_sec = CITIES[1].center();
        assert_eq!(nearest_center(pont_sec), pont_sec);
    }
}
