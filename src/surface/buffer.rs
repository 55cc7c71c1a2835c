use crate::foundation::core::{IntPoint, IntRect, IntSize, Rgba8Premul};
use crate::foundation::error::{TileStoreError, TileStoreResult};
use crate::foundation::region::Region;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Allocate a premultiplied RGBA8 pixmap, rejecting sizes the raster backend cannot hold.
pub(crate) fn alloc_pixmap(size: IntSize) -> TileStoreResult<vello_cpu::Pixmap> {
    if size.is_empty() {
        return Err(TileStoreError::allocation(format!(
            "pixmap size must be non-empty, got {}x{}",
            size.width, size.height
        )));
    }
    let w: u16 = size.width.try_into().map_err(|_| {
        TileStoreError::allocation(format!("pixmap width exceeds u16: {}", size.width))
    })?;
    let h: u16 = size.height.try_into().map_err(|_| {
        TileStoreError::allocation(format!("pixmap height exceeds u16: {}", size.height))
    })?;
    Ok(vello_cpu::Pixmap::new(w, h))
}

/// Bytes needed for one RGBA8 buffer of `size`.
pub(crate) fn pixmap_bytes(size: IntSize) -> usize {
    (size.area() as usize).saturating_mul(4)
}

/// Copy `src_rect` of a `src_width`-wide RGBA8 image into `dst` at `dst_origin`.
///
/// Both rectangles are clipped against their images; pixels falling outside either are skipped.
pub(crate) fn copy_rect(
    src: &[u8],
    src_width: usize,
    src_rect: IntRect,
    dst: &mut [u8],
    dst_width: usize,
    dst_origin: IntPoint,
) {
    let src_height = if src_width == 0 {
        0
    } else {
        src.len() / (src_width * 4)
    };
    let dst_height = if dst_width == 0 {
        0
    } else {
        dst.len() / (dst_width * 4)
    };
    let src_bounds = IntRect::new(0, 0, src_width as i32, src_height as i32);
    let dst_bounds = IntRect::new(0, 0, dst_width as i32, dst_height as i32);

    let dx = dst_origin.x - src_rect.x;
    let dy = dst_origin.y - src_rect.y;
    let r = src_rect
        .intersect(src_bounds)
        .intersect(dst_bounds.translate(-dx, -dy));
    if r.is_empty() {
        return;
    }

    let row_bytes = r.width as usize * 4;
    for row in r.y..r.bottom() {
        let s = (row as usize * src_width + r.x as usize) * 4;
        let d = ((row + dy) as usize * dst_width + (r.x + dx) as usize) * 4;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

/// One pixel buffer of a tile plus the region of it known to hold valid pixels.
pub struct TileBuffer {
    pixmap: vello_cpu::Pixmap,
    rendered: Region,
}

impl TileBuffer {
    pub(crate) fn new(size: IntSize) -> TileStoreResult<Self> {
        Ok(Self {
            pixmap: alloc_pixmap(size)?,
            rendered: Region::new(),
        })
    }

    /// Buffer dimensions.
    pub fn size(&self) -> IntSize {
        IntSize::new(
            i32::from(self.pixmap.width()),
            i32::from(self.pixmap.height()),
        )
    }

    /// Tile-local bounds.
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.size())
    }

    /// Premultiplied RGBA8 pixels.
    pub fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    /// Tile-local region holding valid pixels.
    pub fn rendered_region(&self) -> &Region {
        &self.rendered
    }

    pub(crate) fn add_rendered_region(&mut self, r: IntRect) {
        self.rendered.add_rect(r.intersect(self.bounds()));
    }

    pub(crate) fn add_rendered(&mut self, region: &Region) {
        for r in region.rects() {
            self.add_rendered_region(*r);
        }
    }

    pub(crate) fn clear_rendered_region(&mut self, r: IntRect) {
        self.rendered.subtract_rect(r);
    }

    pub(crate) fn clear_all_rendered(&mut self) {
        self.rendered.clear();
    }

    pub(crate) fn fill(&mut self, color: Rgba8Premul) {
        let rgba = color.to_array();
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Copy `local` (tile-local) from a same-sized pixmap into this buffer.
    pub(crate) fn copy_from(&mut self, src: &vello_cpu::Pixmap, local: IntRect) {
        let width = usize::from(self.pixmap.width());
        copy_rect(
            src.data_as_u8_slice(),
            usize::from(src.width()),
            local,
            self.pixmap.data_as_u8_slice_mut(),
            width,
            local.origin(),
        );
    }
}

impl std::fmt::Debug for TileBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileBuffer")
            .field("size", &self.size())
            .field("rendered", &self.rendered)
            .finish()
    }
}

/// Which half of a double buffer an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferRole {
    /// Last committed content, read by the compositor.
    Front,
    /// In-progress content, written by render passes.
    Back,
}

/// Two pixel buffers and an atomic selector naming the front one.
///
/// Swapping is a single `fetch_xor` on the selector, so a reader on the display context never
/// observes a half-updated pair. Each buffer sits behind its own mutex: the compositor only ever
/// locks the front buffer and a render pass only ever writes the back buffer, so the locks are
/// uncontended outside the short window of a swap.
///
/// A single-buffered pair (the visible snapshot) uses slot 0 for both roles and ignores swaps.
pub struct DoubleBuffer {
    slots: [Mutex<TileBuffer>; 2],
    front: AtomicUsize,
    single: bool,
    size: IntSize,
}

impl DoubleBuffer {
    pub(crate) fn new(size: IntSize) -> TileStoreResult<Self> {
        Ok(Self {
            slots: [Mutex::new(TileBuffer::new(size)?), Mutex::new(TileBuffer::new(size)?)],
            front: AtomicUsize::new(0),
            single: false,
            size,
        })
    }

    pub(crate) fn new_single(size: IntSize) -> TileStoreResult<Self> {
        // Slot 1 is a 1x1 placeholder; single-buffered pairs never select it.
        Ok(Self {
            slots: [
                Mutex::new(TileBuffer::new(size)?),
                Mutex::new(TileBuffer::new(IntSize::new(1, 1))?),
            ],
            front: AtomicUsize::new(0),
            single: true,
            size,
        })
    }

    /// Buffer dimensions.
    pub fn size(&self) -> IntSize {
        self.size
    }

    /// Return `true` for a single-buffered pair.
    pub fn is_single_buffered(&self) -> bool {
        self.single
    }

    /// Slot index currently acting as front.
    pub fn front_index(&self) -> usize {
        self.front.load(Ordering::Acquire)
    }

    fn index_for(&self, role: BufferRole) -> usize {
        if self.single {
            return 0;
        }
        match role {
            BufferRole::Front => self.front_index(),
            BufferRole::Back => self.front_index() ^ 1,
        }
    }

    fn lock(&self, idx: usize) -> MutexGuard<'_, TileBuffer> {
        // A panic while holding a buffer lock leaves pixels, not invariants, inconsistent.
        self.slots[idx].lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the front buffer.
    pub fn with_front<R>(&self, f: impl FnOnce(&TileBuffer) -> R) -> R {
        let guard = self.lock(self.index_for(BufferRole::Front));
        f(&guard)
    }

    /// Hold the front buffer locked; used by compositors that read many tiles at once.
    pub(crate) fn front_guard(&self) -> MutexGuard<'_, TileBuffer> {
        self.lock(self.index_for(BufferRole::Front))
    }

    pub(crate) fn with_buffer_mut<R>(
        &self,
        role: BufferRole,
        f: impl FnOnce(&mut TileBuffer) -> R,
    ) -> R {
        let mut guard = self.lock(self.index_for(role));
        f(&mut guard)
    }

    pub(crate) fn with_back_mut<R>(&self, f: impl FnOnce(&mut TileBuffer) -> R) -> R {
        self.with_buffer_mut(BufferRole::Back, f)
    }

    /// Run `f` with the front buffer borrowed shared and the back buffer borrowed mutably.
    ///
    /// Single-buffered pairs have no distinct back buffer; `f` is not called and `None` is
    /// returned.
    pub(crate) fn with_front_and_back<R>(
        &self,
        f: impl FnOnce(&TileBuffer, &mut TileBuffer) -> R,
    ) -> Option<R> {
        if self.single {
            return None;
        }
        // Lock in slot order so two callers can never wait on each other.
        let (front, mut back) = if self.front_index() == 0 {
            let front = self.lock(0);
            let back = self.lock(1);
            (front, back)
        } else {
            let back = self.lock(0);
            let front = self.lock(1);
            (front, back)
        };
        Some(f(&front, &mut back))
    }

    /// Flip front and back roles with one atomic exchange.
    pub fn swap(&self) {
        if self.single {
            return;
        }
        self.front.fetch_xor(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for DoubleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleBuffer")
            .field("size", &self.size)
            .field("front", &self.front_index())
            .field("single", &self.single)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/buffer.rs"]
mod tests;
