#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless rendering contracts for Geocoin adapters.
//!
//! [`MapSurface`] keeps the rectangles a map would draw for visible caches,
//! [`CachePanel`] formats the interaction popup and [`render_ascii`] turns the
//! surface into a terminal map.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use geocoin_core::{Bounds, CacheSummary, Cell};
use geocoin_oracle::{cell_key_with, Oracle};
use geocoin_system_visibility::Surface;
use glam::DVec2;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Discriminator naming the colour decision of a cache.
pub const COLOR_KEY: &str = "color";

/// Opaque RGB color used when presenting caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel intensity.
    pub red: u8,
    /// Green channel intensity.
    pub green: u8,
    /// Blue channel intensity.
    pub blue: u8,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Deterministic colour of a cache, one oracle sample per hex digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheColor {
    digits: [u8; 6],
}

impl CacheColor {
    /// Derives the colour of the cache on `cell`.
    ///
    /// Digit `k` is drawn from the key `"i,j,color,k"`.
    #[must_use]
    pub fn for_cell(oracle: &Oracle, cell: Cell) -> Self {
        let mut digits = [0u8; 6];
        for (k, digit) in digits.iter_mut().enumerate() {
            let key = cell_key_with(cell.i(), cell.j(), &format!("{COLOR_KEY},{k}"));
            let sample = oracle.luck(&key);
            *digit = ((sample * 16.0).floor() as u8).min(15);
        }
        Self { digits }
    }

    /// Hex digits of the colour, most significant first.
    #[must_use]
    pub const fn digits(&self) -> [u8; 6] {
        self.digits
    }

    /// Colour as RGB channels.
    #[must_use]
    pub const fn color(&self) -> Color {
        let [r1, r0, g1, g0, b1, b0] = self.digits;
        Color::from_rgb_u8(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)
    }
}

impl fmt::Display for CacheColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for digit in self.digits {
            write!(f, "{}", char::from(HEX_DIGITS[usize::from(digit)]))?;
        }
        Ok(())
    }
}

/// Handle to a rectangle drawn on a [`MapSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RectHandle(u64);

impl RectHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Rectangle covering one cache on the map, in `(lng, lat)` coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapRect {
    /// Cell hosting the cache.
    pub cell: Cell,
    /// South-west corner.
    pub min: DVec2,
    /// North-east corner.
    pub max: DVec2,
    /// Fill colour.
    pub color: CacheColor,
}

impl MapRect {
    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// Map surface recording which cache rectangles are currently drawn.
#[derive(Clone, Debug)]
pub struct MapSurface {
    oracle: Oracle,
    next_handle: u64,
    rects: BTreeMap<RectHandle, MapRect>,
}

impl MapSurface {
    /// Creates an empty surface colouring caches with `oracle`.
    #[must_use]
    pub fn new(oracle: Oracle) -> Self {
        Self {
            oracle,
            next_handle: 0,
            rects: BTreeMap::new(),
        }
    }

    /// Rectangle drawn for `handle`, if it is still live.
    #[must_use]
    pub fn rect(&self, handle: RectHandle) -> Option<&MapRect> {
        self.rects.get(&handle)
    }

    /// Live rectangles in drawing order.
    pub fn rects(&self) -> impl Iterator<Item = &MapRect> {
        self.rects.values()
    }

    /// Cells that currently have a rectangle drawn.
    #[must_use]
    pub fn drawn_cells(&self) -> BTreeSet<Cell> {
        self.rects.values().map(|rect| rect.cell).collect()
    }

    /// Number of live rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Reports whether nothing is drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl Surface for MapSurface {
    type Renderable = RectHandle;

    fn materialize(&mut self, cell: Cell, bounds: Bounds) -> RectHandle {
        let handle = RectHandle(self.next_handle);
        self.next_handle += 1;
        let _ = self.rects.insert(
            handle,
            MapRect {
                cell,
                min: DVec2::new(bounds.lng_min, bounds.lat_min),
                max: DVec2::new(bounds.lng_max, bounds.lat_max),
                color: CacheColor::for_cell(&self.oracle, cell),
            },
        );
        handle
    }

    fn release(&mut self, renderable: RectHandle) {
        let _ = self.rects.remove(&renderable);
    }
}

/// Text shown on the interaction popup of a cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePanel {
    /// Heading naming the cache location.
    pub title: String,
    /// Figure lines below the heading.
    pub lines: Vec<String>,
}

impl CachePanel {
    /// Formats the figures of a cache.
    #[must_use]
    pub fn from_summary(summary: &CacheSummary) -> Self {
        Self {
            title: format!(
                "Cache location: {} lat {} lng",
                summary.cell.i(),
                summary.cell.j()
            ),
            lines: vec![
                format!("Available tokens for mint: {}", summary.mint_budget),
                format!("Available unique tokens: {}", summary.ledger_size),
                format!("Tokens held: {}", summary.inventory_size),
            ],
        }
    }
}

impl fmt::Display for CachePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// Renders the square around `player_cell` as text, north at the top.
///
/// `@` marks the player, `#` a drawn cache and `.` an empty cell. The window
/// spans the same `[-radius, radius)` offsets a neighborhood scan visits.
#[must_use]
pub fn render_ascii(surface: &MapSurface, player_cell: Cell, radius: u32) -> String {
    let drawn = surface.drawn_cells();
    let radius = i32::try_from(radius).unwrap_or(i32::MAX / 2);
    let mut map = String::new();
    for di in (-radius..radius).rev() {
        for dj in -radius..radius {
            let cell = player_cell.offset(di, dj);
            let glyph = if cell == player_cell {
                '@'
            } else if drawn.contains(&cell) {
                '#'
            } else {
                '.'
            };
            map.push(glyph);
        }
        map.push('\n');
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::{bounds_of, CellHash};

    #[test]
    fn cache_colors_are_stable() {
        let oracle = Oracle::default();
        let cell = Cell::new(3, -7);
        assert_eq!(
            CacheColor::for_cell(&oracle, cell),
            CacheColor::for_cell(&oracle, cell)
        );
        let hex = CacheColor::for_cell(&oracle, cell).to_string();
        assert_eq!(hex.len(), 7);
        assert!(hex.starts_with('#'));
        assert!(hex[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn color_channels_match_hex_text() {
        let color = CacheColor {
            digits: [0xA, 0x0, 0xF, 0xF, 0x1, 0x2],
        };
        assert_eq!(color.to_string(), "#A0FF12");
        assert_eq!(color.color(), Color::from_rgb_u8(0xA0, 0xFF, 0x12));
        assert_eq!(color.color().to_string(), "#A0FF12");
    }

    #[test]
    fn released_rectangles_disappear() {
        let mut surface = MapSurface::new(Oracle::default());
        let cell = Cell::new(1, 2);
        let handle = surface.materialize(cell, bounds_of(cell, 1.0));

        let rect = surface.rect(handle).copied().expect("drawn");
        assert_eq!(rect.min, DVec2::new(2.0, 1.0));
        assert_eq!(rect.max, DVec2::new(3.0, 2.0));
        assert_eq!(rect.center(), DVec2::new(2.5, 1.5));

        surface.release(handle);
        assert!(surface.rect(handle).is_none());
        assert!(surface.is_empty());
    }

    #[test]
    fn panel_lists_cache_figures() {
        let cell = Cell::new(4, -2);
        let panel = CachePanel::from_summary(&CacheSummary {
            hash: CellHash::from(cell),
            cell,
            mint_budget: 7,
            ledger_size: 2,
            inventory_size: 5,
        });
        let text = panel.to_string();
        assert!(text.starts_with("Cache location: 4 lat -2 lng\n"));
        assert!(text.contains("Available tokens for mint: 7"));
        assert!(text.contains("Available unique tokens: 2"));
        assert!(text.contains("Tokens held: 5"));
    }

    #[test]
    fn ascii_map_marks_player_and_caches() {
        let mut surface = MapSurface::new(Oracle::default());
        let beside = Cell::new(-1, -1);
        let _ = surface.materialize(beside, bounds_of(beside, 1.0));
        let outside = Cell::new(0, 0);
        let _ = surface.materialize(outside, bounds_of(outside, 1.0));

        let map = render_ascii(&surface, Cell::new(-1, 0), 1);
        assert_eq!(map, "#@\n..\n");
    }
}
