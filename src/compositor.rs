use crate::foundation::core::{IntPoint, IntRect, IntSize};
use crate::foundation::error::TileStoreResult;
use crate::surface::buffer::{DoubleBuffer, TileBuffer};
use crate::surface::tile::TileId;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One tile as the compositor should draw it.
#[derive(Clone, Debug)]
pub struct CompositeTile {
    /// Pool tile id.
    pub id: TileId,
    /// Pixel pair; only the front buffer is read.
    pub buffers: Arc<DoubleBuffer>,
    /// Content-space point the front pixels belong to. For uncommitted tiles this is the shifted
    /// (old) position.
    pub content_origin: IntPoint,
    /// `false` while the tile is awaiting its first render for its current cell.
    pub committed: bool,
}

/// Everything needed to draw one display frame from tile front buffers.
#[derive(Clone, Debug)]
pub struct CompositeFrame {
    /// Content-space rectangle shown on the display.
    pub viewport: IntRect,
    /// Tiles overlapping the viewport.
    pub tiles: Vec<CompositeTile>,
}

/// A composited display frame, RGBA8 premultiplied, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 bytes.
    pub data: Vec<u8>,
}

impl DisplayFrame {
    /// RGBA of pixel `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// Display-side consumer of tile front buffers.
///
/// Implementations run on the display context and must never touch a back buffer.
pub trait Compositor: Send {
    /// Draw the tiles of `frame` to the display.
    fn composite(&mut self, frame: &CompositeFrame) -> TileStoreResult<()>;

    /// Draw a directly rendered viewport snapshot (tiling disabled or degraded).
    fn present_direct(&mut self, viewport: IntRect, snapshot: &DoubleBuffer)
    -> TileStoreResult<()>;

    /// The display surface changed size.
    fn resize_surface(&mut self, _size: IntSize) -> TileStoreResult<()> {
        Ok(())
    }

    /// Release every display resource. Must not be observed half-done.
    fn destroy_resources(&mut self) {}
}

/// Shared handle to the latest frame a [`CpuCompositor`] produced.
#[derive(Clone, Debug, Default)]
pub struct FrameReader {
    latest: Arc<Mutex<Option<DisplayFrame>>>,
    presented: Arc<AtomicU64>,
}

impl FrameReader {
    /// Copy of the most recent frame.
    pub fn latest(&self) -> Option<DisplayFrame> {
        self.slot().clone()
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    fn slot(&self) -> MutexGuard<'_, Option<DisplayFrame>> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, frame: Option<DisplayFrame>) {
        let presented = frame.is_some();
        *self.slot() = frame;
        if presented {
            self.presented.fetch_add(1, Ordering::AcqRel);
        }
    }
}

const CHECKER_CELL: u32 = 8;
const CHECKER_LIGHT: [u8; 4] = [0xee, 0xee, 0xee, 0xff];
const CHECKER_DARK: [u8; 4] = [0xcc, 0xcc, 0xcc, 0xff];

/// Reference compositor rasterizing into an in-memory [`DisplayFrame`].
///
/// Unrendered areas show a checkerboard. Uncommitted tiles are drawn first, at their shifted
/// position, so committed tiles always win where both cover a pixel.
#[derive(Debug, Default)]
pub struct CpuCompositor {
    surface: IntSize,
    out: FrameReader,
}

impl CpuCompositor {
    /// Create a compositor and the reader observing its output.
    pub fn new() -> (Self, FrameReader) {
        let c = Self::default();
        let reader = c.out.clone();
        (c, reader)
    }

    /// Current surface size (last `resize_surface`, zero before).
    pub fn surface_size(&self) -> IntSize {
        self.surface
    }
}

struct Layer<'a> {
    front: MutexGuard<'a, TileBuffer>,
    origin: IntPoint,
}

impl Compositor for CpuCompositor {
    #[tracing::instrument(skip_all, fields(tiles = frame.tiles.len()))]
    fn composite(&mut self, frame: &CompositeFrame) -> TileStoreResult<()> {
        let mut order: Vec<&CompositeTile> = frame.tiles.iter().collect();
        order.sort_by_key(|t| t.committed);
        let layers: Vec<Layer<'_>> = order
            .into_iter()
            .map(|t| Layer {
                front: t.buffers.front_guard(),
                origin: t.content_origin,
            })
            .collect();
        let out = raster(frame.viewport, &layers);
        drop(layers);
        self.out.publish(out);
        Ok(())
    }

    fn present_direct(
        &mut self,
        viewport: IntRect,
        snapshot: &DoubleBuffer,
    ) -> TileStoreResult<()> {
        let layers = [Layer {
            front: snapshot.front_guard(),
            origin: viewport.origin(),
        }];
        let out = raster(viewport, &layers);
        drop(layers);
        self.out.publish(out);
        Ok(())
    }

    fn resize_surface(&mut self, size: IntSize) -> TileStoreResult<()> {
        self.surface = size;
        Ok(())
    }

    fn destroy_resources(&mut self) {
        self.out.publish(None);
    }
}

fn raster(viewport: IntRect, layers: &[Layer<'_>]) -> Option<DisplayFrame> {
    if viewport.is_empty() {
        return None;
    }
    let width = viewport.width as usize;
    let height = viewport.height as usize;
    let mut data = vec![0u8; width * height * 4];

    // Content-space rects of valid pixels per layer, with their tile-local source origin.
    let spans: Vec<Vec<(IntRect, IntPoint)>> = layers
        .iter()
        .map(|l| {
            l.front
                .rendered_region()
                .rects()
                .iter()
                .map(|r| (r.translate(l.origin.x, l.origin.y).intersect(viewport), l.origin))
                .filter(|(r, _)| !r.is_empty())
                .collect()
        })
        .collect();

    data.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, dst)| {
            let y = viewport.y + row as i32;
            for (x, px) in dst.chunks_exact_mut(4).enumerate() {
                let light = ((x as u32 / CHECKER_CELL) + (row as u32 / CHECKER_CELL)) % 2 == 0;
                px.copy_from_slice(if light { &CHECKER_LIGHT } else { &CHECKER_DARK });
            }
            for (layer, rects) in layers.iter().zip(&spans) {
                let src = layer.front.pixmap().data_as_u8_slice();
                let src_w = usize::from(layer.front.pixmap().width());
                for (r, origin) in rects {
                    if y < r.y || y >= r.bottom() {
                        continue;
                    }
                    let sx = (r.x - origin.x) as usize;
                    let sy = (y - origin.y) as usize;
                    let dx = (r.x - viewport.x) as usize;
                    let n = r.width as usize * 4;
                    let s = (sy * src_w + sx) * 4;
                    dst[dx * 4..dx * 4 + n].copy_from_slice(&src[s..s + n]);
                }
            }
        });

    Some(DisplayFrame {
        width: width as u32,
        height: height as u32,
        data,
    })
}

#[cfg(test)]
#[path = "../tests/unit/compositor.rs"]
mod tests;
