use crate::dispatch::DisplayHandle;
use crate::surface::buffer::DoubleBuffer;
use crate::surface::tile::TileId;
use std::sync::Arc;

/// Collects the tiles written during one render pass and flips them together.
#[derive(Debug, Default)]
pub struct SwapCoordinator {
    batch: Vec<(TileId, Arc<DoubleBuffer>)>,
    commits: u64,
    flips: u64,
}

impl SwapCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile whose back buffer was written; adding the same tile twice is a no-op.
    pub fn add(&mut self, id: TileId, buffers: &Arc<DoubleBuffer>) {
        if self.batch.iter().any(|(t, _)| *t == id) {
            return;
        }
        self.batch.push((id, Arc::clone(buffers)));
    }

    /// Return `true` when `id` is in the current batch.
    pub fn contains(&self, id: TileId) -> bool {
        self.batch.iter().any(|(t, _)| *t == id)
    }

    /// Tiles waiting for the next commit.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Return `true` when nothing waits for a commit.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Flip every collected tile inside one synchronous display task, then clear the rendered
    /// region of each tile's new back buffer.
    ///
    /// Returns the number of tiles flipped; an empty batch flips nothing. If the display context
    /// cannot run the task (stopped, or this is the display thread) the flips happen here.
    pub fn commit(&mut self, display: &DisplayHandle) -> usize {
        if self.batch.is_empty() {
            return 0;
        }
        let batch = std::mem::take(&mut self.batch);
        let buffers: Vec<Arc<DoubleBuffer>> = batch.into_iter().map(|(_, b)| b).collect();

        let flip = buffers.clone();
        let res = display.post_sync(move |_| {
            for b in &flip {
                b.swap();
            }
        });
        if let Err(e) = res {
            tracing::warn!(error = %e, "swap barrier unavailable, flipping on the content side");
            for b in &buffers {
                b.swap();
            }
        }

        for b in &buffers {
            b.with_back_mut(|back| back.clear_all_rendered());
        }

        let n = buffers.len();
        self.commits = self.commits.saturating_add(1);
        self.flips = self.flips.saturating_add(n as u64);
        tracing::trace!(tiles = n, "swap committed");
        n
    }

    /// Drop the batch without flipping (full reset).
    pub fn discard(&mut self) {
        self.batch.clear();
    }

    /// Commits that flipped at least one tile.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Total tiles flipped.
    pub fn flips(&self) -> u64 {
        self.flips
    }
}

#[cfg(test)]
#[path = "../tests/unit/swap.rs"]
mod tests;
