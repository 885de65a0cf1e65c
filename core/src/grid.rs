//! Conversions between continuous positions and discrete grid cells.

use crate::{Bounds, Cell, CellHash, Position};

/// Cell containing the provided latitude and longitude.
#[must_use]
pub fn cell_of(lat: f64, lng: f64, tile_degrees: f64) -> Cell {
    Cell::new(
        floor_index(lat, tile_degrees),
        floor_index(lng, tile_degrees),
    )
}

/// Rectangle covered by the cell's tile.
#[must_use]
pub fn bounds_of(cell: Cell, tile_degrees: f64) -> Bounds {
    let i = f64::from(cell.i());
    let j = f64::from(cell.j());
    Bounds {
        lat_min: i * tile_degrees,
        lng_min: j * tile_degrees,
        lat_max: (i + 1.0) * tile_degrees,
        lng_max: (j + 1.0) * tile_degrees,
    }
}

/// Centre point of the cell's tile.
#[must_use]
pub fn center_of(cell: Cell, tile_degrees: f64) -> Position {
    Position::new(
        (f64::from(cell.i()) + 0.5) * tile_degrees,
        (f64::from(cell.j()) + 0.5) * tile_degrees,
    )
}

/// Identity key of the cell.
#[must_use]
pub const fn hash_of(cell: Cell) -> CellHash {
    cell.cell_hash()
}

/// Enumerates the `(2R)×(2R)` window of cells around `center`.
///
/// Offsets range over `[-R, R)` on both axes, latitude offset outermost.
#[must_use]
pub fn neighborhood(center: Cell, radius: u32) -> Neighborhood {
    let radius = i32::try_from(radius).unwrap_or(i32::MAX);
    Neighborhood {
        center,
        radius,
        di: -radius,
        dj: -radius,
    }
}

/// Iterator returned by [`neighborhood`].
#[derive(Clone, Debug)]
pub struct Neighborhood {
    center: Cell,
    radius: i32,
    di: i32,
    dj: i32,
}

impl Iterator for Neighborhood {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.di >= self.radius {
            return None;
        }

        let cell = self.center.offset(self.di, self.dj);
        self.dj += 1;
        if self.dj >= self.radius {
            self.dj = -self.radius;
            self.di += 1;
        }
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let width = 2 * i64::from(self.radius);
        let rows_left = i64::from(self.radius) - i64::from(self.di);
        let remaining = if rows_left <= 0 {
            0
        } else {
            (rows_left - 1) * width + (i64::from(self.radius) - i64::from(self.dj))
        };
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Neighborhood {}

fn floor_index(value: f64, tile_degrees: f64) -> i32 {
    (value / tile_degrees).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f64 = 1e-4;

    #[test]
    fn cell_of_floors_toward_negative_infinity() {
        assert_eq!(cell_of(0.000_05, 0.000_15, TILE), Cell::new(0, 1));
        assert_eq!(cell_of(-0.000_05, -0.000_15, TILE), Cell::new(-1, -2));
    }

    #[test]
    fn points_in_same_tile_share_a_cell() {
        let a = cell_of(36.989_41, -122.062_71, TILE);
        let b = cell_of(36.989_49, -122.062_79, TILE);
        assert_eq!(a, b);
    }

    #[test]
    fn bounds_cover_the_tile() {
        let cell = Cell::new(3, -2);
        let bounds = bounds_of(cell, TILE);
        assert!(bounds.contains(center_of(cell, TILE)));
        assert!((bounds.lat_max - bounds.lat_min - TILE).abs() < 1e-12);
        assert!((bounds.lng_max - bounds.lng_min - TILE).abs() < 1e-12);
    }

    #[test]
    fn centre_maps_back_to_its_cell() {
        for cell in [Cell::new(0, 0), Cell::new(369_894, -1_220_628), Cell::new(-7, 5)] {
            let centre = center_of(cell, TILE);
            assert_eq!(cell_of(centre.lat, centre.lng, TILE), cell);
        }
    }

    #[test]
    fn neighborhood_spans_half_open_window() {
        let center = Cell::new(10, -10);
        let cells: Vec<Cell> = neighborhood(center, 2).collect();
        assert_eq!(cells.len(), 16);
        assert_eq!(cells.first(), Some(&Cell::new(8, -12)));
        assert_eq!(cells.last(), Some(&Cell::new(11, -9)));
        assert_eq!(cells[1], Cell::new(8, -11));
        assert!(!cells.contains(&Cell::new(12, -10)));
    }

    #[test]
    fn neighborhood_reports_exact_length() {
        let mut cells = neighborhood(Cell::new(0, 0), 8);
        assert_eq!(cells.len(), 256);
        let _ = cells.next();
        assert_eq!(cells.len(), 255);
        assert_eq!(neighborhood(Cell::new(0, 0), 0).count(), 0);
    }
}
