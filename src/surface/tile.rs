use crate::foundation::core::{IntRect, IntSize, Rgba8Premul};
use crate::foundation::error::TileStoreResult;
use crate::foundation::region::Region;
use crate::surface::buffer::{BufferRole, DoubleBuffer};
use std::sync::Arc;

/// Stable identifier of a pool tile (its index in the pool).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u32);

/// Signed offset, in whole tiles, from the grid cell a tile is assigned to, to the cell its pixels
/// were rendered for.
///
/// Non-zero only while the tile is uncommitted after a grid move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileShift {
    /// Horizontal offset in tiles.
    pub dx: i32,
    /// Vertical offset in tiles.
    pub dy: i32,
}

impl TileShift {
    /// No offset.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// Return `true` when both offsets are zero.
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// A double-buffered tile plus its validity bookkeeping.
///
/// The pixel pair is shared with the display context through an `Arc`; everything else is owned
/// by the content context and only read by the compositor through snapshots.
#[derive(Debug)]
pub struct Tile {
    id: TileId,
    buffers: Arc<DoubleBuffer>,
    committed: bool,
    shift: TileShift,
    background_painted: bool,
}

impl Tile {
    pub(crate) fn new(id: TileId, size: IntSize) -> TileStoreResult<Self> {
        Ok(Self {
            id,
            buffers: Arc::new(DoubleBuffer::new(size)?),
            committed: false,
            shift: TileShift::ZERO,
            background_painted: false,
        })
    }

    /// Pool identifier.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Tile dimensions.
    pub fn size(&self) -> IntSize {
        self.buffers.size()
    }

    /// Shared pixel pair.
    pub fn buffers(&self) -> &Arc<DoubleBuffer> {
        &self.buffers
    }

    /// Return `true` once the tile's pixels are known to belong to its current grid cell.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Current shift (zero when committed).
    pub fn shift(&self) -> TileShift {
        self.shift
    }

    /// Mark uncommitted, forget every rendered pixel, clear the shift.
    ///
    /// With `clear_background` the next paint fills the back buffer with the background again.
    pub fn reset(&mut self, clear_background: bool) {
        self.committed = false;
        self.shift = TileShift::ZERO;
        self.buffers
            .with_buffer_mut(BufferRole::Front, |b| b.clear_all_rendered());
        self.buffers
            .with_buffer_mut(BufferRole::Back, |b| b.clear_all_rendered());
        if clear_background {
            self.background_painted = false;
        }
    }

    /// Fill the back buffer with `color`, once per tile lifetime.
    pub fn paint_background(&mut self, color: Rgba8Premul) {
        if self.background_painted {
            return;
        }
        self.buffers.with_back_mut(|b| b.fill(color));
        self.background_painted = true;
    }

    /// Return `true` when `local` (tile-local) is fully covered by valid front pixels that belong
    /// to this tile's cell.
    pub fn is_rendered(&self, local: IntRect) -> bool {
        self.committed
            && self
                .buffers
                .with_front(|f| f.rendered_region().contains_rect(local))
    }

    /// Front buffer's rendered region (tile-local).
    pub fn front_region(&self) -> Region {
        self.buffers.with_front(|f| f.rendered_region().clone())
    }

    /// Back buffer's rendered region (tile-local).
    pub fn back_region(&self) -> Region {
        self.buffers
            .with_buffer_mut(BufferRole::Back, |b| b.rendered_region().clone())
    }

    /// Flip front and back buffers.
    pub fn swap_buffers(&self) {
        self.buffers.swap();
    }

    /// Extend the rendered region of `role`.
    pub fn add_rendered_region(&self, role: BufferRole, r: IntRect) {
        self.buffers.with_buffer_mut(role, |b| b.add_rendered_region(r));
    }

    /// Shrink the rendered region of `role`.
    pub fn clear_rendered_region(&self, role: BufferRole, r: IntRect) {
        self.buffers
            .with_buffer_mut(role, |b| b.clear_rendered_region(r));
    }

    /// Copy still-valid front pixels outside `invalid` into the back buffer.
    ///
    /// Must run before a partial repaint of the back buffer, otherwise the next swap would show
    /// whatever stale pixels the back buffer held outside the repainted rect. Pixels the back
    /// buffer already holds from this pass are left alone.
    pub fn copy_forward(&self, invalid: IntRect) {
        self.buffers.with_front_and_back(|front, back| {
            let mut keep = front.rendered_region().clone();
            keep.subtract_rect(invalid);
            keep.subtract_region(back.rendered_region());
            for r in keep.rects() {
                back.copy_from(front.pixmap(), *r);
            }
            back.add_rendered(&keep);
        });
    }

    pub(crate) fn commit(&mut self) {
        self.committed = true;
        self.shift = TileShift::ZERO;
    }

    pub(crate) fn uncommit_with_shift(&mut self, shift: TileShift) {
        self.committed = false;
        self.shift = shift;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/tile.rs"]
mod tests;
