use crate::foundation::core::{IntPoint, IntRect};
use crate::foundation::region::Region;
use crate::geometry::state::{GeometryState, GridSize};
use crate::surface::buffer::BufferRole;
use crate::surface::tile::{Tile, TileId, TileShift};

/// Result of moving the pool's tiles onto a new grid.
#[derive(Clone, Debug)]
pub struct ReassignOutcome {
    /// New geometry, ready to publish.
    pub state: GeometryState,
    /// Tiles whose content still lies inside the new grid.
    pub kept: usize,
    /// Tiles moved to a cell they hold no content for.
    pub relocated: usize,
    /// Content-space areas cleared from kept tiles because an unrendered job was clipped there.
    pub stale: Vec<IntRect>,
}

/// Assign every tile of `old` to a cell of the grid at `new_origin` with shape `new_grid`.
///
/// A tile whose last-rendered cell (its old cell plus its shift) falls inside the new grid keeps
/// its pixels and is committed to that cell. Parts of such a tile that `attempted_in` reports as
/// clipped-but-never-painted are cleared and returned in [`ReassignOutcome::stale`] so the caller
/// can queue them again. All other tiles fill the remaining cells in order, uncommitted, with a
/// shift pointing back at the cell their pixels belong to.
///
/// `tiles` is the pool's tile list, indexed by [`TileId`].
pub fn reassign_tiles(
    old: &GeometryState,
    new_origin: IntPoint,
    new_grid: GridSize,
    tiles: &mut [Tile],
    attempted_in: impl Fn(IntRect) -> Region,
) -> ReassignOutcome {
    let tile_size = old.tile_size();
    let tw = tile_size.width.max(1);
    let th = tile_size.height.max(1);
    let wide = new_grid.wide.max(1) as usize;
    let new_rect = IntRect::from_origin_size(new_origin, new_grid.pixel_size(tile_size));

    let mut slots: Vec<Option<TileId>> = vec![None; new_grid.count()];
    let mut leftovers: Vec<(TileId, IntPoint)> = Vec::new();
    let mut kept = 0usize;
    let mut stale = Vec::new();

    for (index, &id) in old.tiles().iter().enumerate() {
        let Some(tile) = tiles.get_mut(id.0 as usize) else {
            continue;
        };
        let (col, row) = old.cell_of(index);
        let shift = tile.shift();
        let painted_at = IntPoint::new(
            old.origin().x + (col + shift.dx) * tw,
            old.origin().y + (row + shift.dy) * th,
        );

        let rel_x = painted_at.x - new_origin.x;
        let rel_y = painted_at.y - new_origin.y;
        let slot = (new_rect.contains_point(painted_at) && rel_x % tw == 0 && rel_y % th == 0)
            .then(|| (rel_y / th) as usize * wide + (rel_x / tw) as usize)
            .filter(|&i| slots.get(i).is_some_and(|s| s.is_none()));

        let Some(i) = slot else {
            leftovers.push((id, painted_at));
            continue;
        };
        slots[i] = Some(id);
        tile.commit();
        kept += 1;

        let cell = IntRect::from_origin_size(painted_at, tile_size);
        let rendered = tile.front_region().translate(painted_at.x, painted_at.y);
        let overlap = attempted_in(cell).intersect_region(&rendered);
        for r in overlap.rects() {
            let local = r.translate(-painted_at.x, -painted_at.y);
            tile.clear_rendered_region(BufferRole::Front, local);
            tile.clear_rendered_region(BufferRole::Back, local);
            stale.push(*r);
        }
    }

    let mut relocated = 0usize;
    let mut leftovers = leftovers.into_iter();
    for (i, slot) in slots.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let Some((id, painted_at)) = leftovers.next() else {
            break;
        };
        let cell_x = new_origin.x + (i % wide) as i32 * tw;
        let cell_y = new_origin.y + (i / wide) as i32 * th;
        if let Some(tile) = tiles.get_mut(id.0 as usize) {
            tile.uncommit_with_shift(TileShift {
                dx: (painted_at.x - cell_x).div_euclid(tw),
                dy: (painted_at.y - cell_y).div_euclid(th),
            });
        }
        *slot = Some(id);
        relocated += 1;
    }

    let assigned: Vec<TileId> = slots.into_iter().flatten().collect();
    debug_assert_eq!(assigned.len(), old.tiles().len(), "tile count changed");
    tracing::debug!(kept, relocated, stale = stale.len(), "tiles reassigned");

    ReassignOutcome {
        state: GeometryState::new(new_origin, new_grid, tile_size, assigned),
        kept,
        relocated,
        stale,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/reassign.rs"]
mod tests;
