use crate::foundation::core::{IntPoint, IntRect, IntSize};
use crate::surface::tile::TileId;

/// Grid dimensions in tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct GridSize {
    /// Columns.
    pub wide: u32,
    /// Rows.
    pub high: u32,
}

impl GridSize {
    /// Create a grid size.
    pub const fn new(wide: u32, high: u32) -> Self {
        Self { wide, high }
    }

    /// Number of cells.
    pub fn count(self) -> usize {
        self.wide as usize * self.high as usize
    }

    /// Pixel extent for tiles of `tile`.
    pub fn pixel_size(self, tile: IntSize) -> IntSize {
        IntSize::new(
            (self.wide as i32).saturating_mul(tile.width),
            (self.high as i32).saturating_mul(tile.height),
        )
    }
}

/// Grid origin, dimensions and the tile placed in each cell (row-major).
///
/// The state never owns pixels; it only names pool tiles by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeometryState {
    origin: IntPoint,
    grid: GridSize,
    tile_size: IntSize,
    tiles: Vec<TileId>,
}

impl GeometryState {
    /// Build a state; `tiles.len()` must equal `grid.count()`.
    pub fn new(origin: IntPoint, grid: GridSize, tile_size: IntSize, tiles: Vec<TileId>) -> Self {
        debug_assert_eq!(tiles.len(), grid.count());
        Self {
            origin,
            grid,
            tile_size,
            tiles,
        }
    }

    /// Top-left content-space point of cell `(0, 0)`.
    pub fn origin(&self) -> IntPoint {
        self.origin
    }

    /// Grid dimensions.
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Tile dimensions.
    pub fn tile_size(&self) -> IntSize {
        self.tile_size
    }

    /// Tiles in row-major cell order.
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    /// Return `true` when no tile is assigned.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Content-space rectangle covered by the grid.
    pub fn grid_rect(&self) -> IntRect {
        IntRect::from_origin_size(self.origin, self.grid.pixel_size(self.tile_size))
    }

    /// `(column, row)` of cell `index`.
    pub fn cell_of(&self, index: usize) -> (i32, i32) {
        let wide = self.grid.wide.max(1) as usize;
        ((index % wide) as i32, (index / wide) as i32)
    }

    /// Content-space rectangle of cell `(col, row)`.
    pub fn cell_rect(&self, col: i32, row: i32) -> IntRect {
        IntRect::new(
            self.origin.x + col * self.tile_size.width,
            self.origin.y + row * self.tile_size.height,
            self.tile_size.width,
            self.tile_size.height,
        )
    }

    /// Content-space rectangle of cell `index`.
    pub fn tile_rect(&self, index: usize) -> IntRect {
        let (c, r) = self.cell_of(index);
        self.cell_rect(c, r)
    }

    /// Cell index holding `id`.
    pub fn index_of(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| *t == id)
    }

    /// Cells overlapping `rect`, as `(index, tile, cell rect)`.
    pub fn tiles_in_rect(&self, rect: IntRect) -> Vec<(usize, TileId, IntRect)> {
        let r = rect.intersect(self.grid_rect());
        if r.is_empty() || self.tile_size.is_empty() {
            return Vec::new();
        }
        let tw = self.tile_size.width;
        let th = self.tile_size.height;
        let c0 = (r.x - self.origin.x) / tw;
        let r0 = (r.y - self.origin.y) / th;
        let c1 = (r.right() - 1 - self.origin.x) / tw;
        let r1 = (r.bottom() - 1 - self.origin.y) / th;

        let mut out = Vec::with_capacity(((c1 - c0 + 1) * (r1 - r0 + 1)) as usize);
        for row in r0..=r1 {
            for col in c0..=c1 {
                let index = row as usize * self.grid.wide as usize + col as usize;
                out.push((index, self.tiles[index], self.cell_rect(col, row)));
            }
        }
        out
    }
}

/// Front (authoritative) and back (being prepared) geometry.
#[derive(Clone, Debug, Default)]
pub struct GeometryPair {
    front: GeometryState,
    back: GeometryState,
}

impl GeometryPair {
    /// Authoritative geometry for every position and compositing query.
    pub fn front(&self) -> &GeometryState {
        &self.front
    }

    /// Install `next` as the back state and swap it to the front.
    ///
    /// Both states always hold the same tile set; only assignment and origin differ.
    pub fn publish(&mut self, next: GeometryState) {
        debug_assert!(
            self.front.is_empty() || same_tile_set(&self.front, &next),
            "geometry swap must preserve the tile set"
        );
        self.back = next;
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Drop both states (pool lost or emptied).
    pub fn clear(&mut self) {
        self.front = GeometryState::default();
        self.back = GeometryState::default();
    }
}

fn same_tile_set(a: &GeometryState, b: &GeometryState) -> bool {
    let mut x = a.tiles.clone();
    let mut y = b.tiles.clone();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/state.rs"]
mod tests;
