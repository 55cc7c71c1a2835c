use crate::foundation::core::IntSize;
use crate::foundation::error::{TileStoreError, TileStoreResult};
use crate::surface::buffer::{DoubleBuffer, alloc_pixmap, pixmap_bytes};
use crate::surface::tile::{Tile, TileId};
use std::sync::Arc;

/// Counters describing what the pool has allocated.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SurfacePoolStats {
    /// Tiles currently held.
    pub tiles: usize,
    /// Bytes held by tile buffers and the shared scratch buffer.
    pub retained_bytes: usize,
    /// Bytes held by the visible snapshot.
    pub snapshot_bytes: usize,
    /// Number of snapshot (re)allocations.
    pub snapshot_allocs: u64,
    /// `true` when tile allocation failed and the pool fell back to direct rendering.
    pub degraded: bool,
}

/// Fixed pool of double-buffered tiles plus the buffers shared by all of them.
///
/// Tiles are allocated once, on the first [`SurfacePool::initialize`], and never freed or resized
/// afterwards. The pool performs no locking; [`crate::surface::lease::SharedPool`] serializes
/// access between stores.
pub struct SurfacePool {
    requested: usize,
    max_pool_bytes: usize,
    tile_size: Option<IntSize>,
    tiles: Vec<Tile>,
    scratch: Option<vello_cpu::Pixmap>,
    snapshot: Option<Arc<DoubleBuffer>>,
    stats: SurfacePoolStats,
}

impl SurfacePool {
    /// Create an uninitialized pool of `count` tiles bounded by `max_pool_bytes`.
    pub fn new(count: usize, max_pool_bytes: usize) -> Self {
        Self {
            requested: count,
            max_pool_bytes,
            tile_size: None,
            tiles: Vec::new(),
            scratch: None,
            snapshot: None,
            stats: SurfacePoolStats::default(),
        }
    }

    /// Allocate the tiles on first use; later calls are no-ops.
    ///
    /// Allocation failure never fails initialization: the pool stays empty and the caller must
    /// render directly.
    pub fn initialize(&mut self, tile_size: IntSize) {
        if self.tile_size.is_some() {
            return;
        }
        self.tile_size = Some(tile_size);
        if self.requested == 0 {
            tracing::debug!("tile pool disabled (tile_count = 0)");
            return;
        }

        match self.allocate(tile_size) {
            Ok((tiles, scratch)) => {
                self.stats.tiles = tiles.len();
                self.stats.retained_bytes =
                    pixmap_bytes(tile_size).saturating_mul(2 * tiles.len() + 1);
                self.tiles = tiles;
                self.scratch = Some(scratch);
                tracing::debug!(
                    tiles = self.stats.tiles,
                    bytes = self.stats.retained_bytes,
                    "tile pool initialized"
                );
            }
            Err(e) => {
                self.stats.degraded = true;
                tracing::warn!(error = %e, "tile pool allocation failed, rendering directly");
            }
        }
    }

    fn allocate(&self, tile_size: IntSize) -> TileStoreResult<(Vec<Tile>, vello_cpu::Pixmap)> {
        let per_tile = pixmap_bytes(tile_size);
        let needed = per_tile
            .saturating_mul(2)
            .saturating_mul(self.requested)
            .saturating_add(per_tile);
        if needed > self.max_pool_bytes {
            return Err(TileStoreError::allocation(format!(
                "{} tiles of {}x{} need {needed} bytes, budget is {}",
                self.requested, tile_size.width, tile_size.height, self.max_pool_bytes
            )));
        }

        let mut tiles = Vec::new();
        tiles
            .try_reserve_exact(self.requested)
            .map_err(|e| TileStoreError::allocation(format!("reserve tile list: {e}")))?;
        for i in 0..self.requested {
            let id = u32::try_from(i)
                .map_err(|_| TileStoreError::allocation("tile count exceeds u32"))?;
            tiles.push(Tile::new(TileId(id), tile_size)?);
        }
        let scratch = alloc_pixmap(tile_size)?;
        Ok((tiles, scratch))
    }

    /// Return `true` once `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.tile_size.is_some()
    }

    /// Tile dimensions, once initialized.
    pub fn tile_size(&self) -> Option<IntSize> {
        self.tile_size
    }

    /// Return `true` when the pool holds no tiles (tiling disabled or allocation failed).
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles held.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// The fixed tile list.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Look a tile up by id.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0 as usize)
    }

    /// Borrow a tile together with the shared scratch buffer it is painted through.
    pub(crate) fn tile_and_scratch_mut(
        &mut self,
        id: TileId,
    ) -> Option<(&mut Tile, &mut vello_cpu::Pixmap)> {
        let tile = self.tiles.get_mut(id.0 as usize)?;
        let scratch = self.scratch.as_mut()?;
        Some((tile, scratch))
    }

    /// Scratch buffer shared by every tile; only one tile is painted at a time.
    pub fn shared_back_buffer(&self) -> Option<&vello_cpu::Pixmap> {
        self.scratch.as_ref()
    }

    /// Single-buffered tile sized to the viewport, used for direct rendering.
    ///
    /// Reallocated only when `size` differs from the current snapshot.
    pub fn ensure_visible_snapshot(&mut self, size: IntSize) -> TileStoreResult<Arc<DoubleBuffer>> {
        if let Some(s) = &self.snapshot
            && s.size() == size
        {
            return Ok(Arc::clone(s));
        }
        let snapshot = Arc::new(DoubleBuffer::new_single(size)?);
        self.stats.snapshot_bytes = pixmap_bytes(size);
        self.stats.snapshot_allocs = self.stats.snapshot_allocs.saturating_add(1);
        self.snapshot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Current visible snapshot, if one was allocated.
    pub fn visible_snapshot(&self) -> Option<&Arc<DoubleBuffer>> {
        self.snapshot.as_ref()
    }

    /// Reset every tile (full grid rebuild).
    pub(crate) fn reset_all(&mut self, clear_background: bool) {
        for t in &mut self.tiles {
            t.reset(clear_background);
        }
    }

    /// Allocation counters.
    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }
}

impl std::fmt::Debug for SurfacePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfacePool")
            .field("requested", &self.requested)
            .field("tile_size", &self.tile_size)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/pool.rs"]
mod tests;
