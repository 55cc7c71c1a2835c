use crate::foundation::core::{IntPoint, IntRect, IntSize, Rgba8Premul};
use crate::foundation::error::{TileStoreError, TileStoreResult};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The page content producer the tile store paints from.
///
/// Coordinates are in scaled content space: the store multiplies [`ContentRenderer::contents_size`]
/// by the current scale and passes that scale to `paint`.
pub trait ContentRenderer {
    /// Unscaled content size.
    fn contents_size(&self) -> IntSize;

    /// Bring layout up to date. Called before every render pass.
    fn update_layout(&mut self) -> TileStoreResult<()> {
        Ok(())
    }

    /// Paint exactly `rect` of content into `target`, whose pixel `(0, 0)` shows content point
    /// `target_origin`.
    ///
    /// Pixels of `target` outside `rect` may be overwritten; the caller only keeps `rect`.
    fn paint(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        target_origin: IntPoint,
        rect: IntRect,
        scale: f64,
    ) -> TileStoreResult<()>;
}

/// A document of horizontal color bands, rasterized with `vello_cpu`.
pub struct StripedDocument {
    size: IntSize,
    band: i32,
    colors: Vec<Rgba8Premul>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl StripedDocument {
    /// Create a document of `size` with bands `band` pixels tall cycling through `colors`.
    pub fn new(size: IntSize, band: i32, colors: Vec<Rgba8Premul>) -> TileStoreResult<Self> {
        if band <= 0 {
            return Err(TileStoreError::config("band height must be positive"));
        }
        if colors.is_empty() {
            return Err(TileStoreError::config("at least one band color is required"));
        }
        Ok(Self {
            size,
            band,
            colors,
            ctx: None,
        })
    }

    /// Band color at unscaled content row `y`.
    pub fn color_at(&self, y: i32) -> Rgba8Premul {
        let i = y.div_euclid(self.band).rem_euclid(self.colors.len() as i32);
        self.colors[i as usize]
    }
}

impl ContentRenderer for StripedDocument {
    fn contents_size(&self) -> IntSize {
        self.size
    }

    fn paint(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        target_origin: IntPoint,
        rect: IntRect,
        scale: f64,
    ) -> TileStoreResult<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TileStoreError::render(format!("invalid scale {scale}")));
        }
        let (w, h) = (target.width(), target.height());
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            -f64::from(target_origin.x),
            -f64::from(target_origin.y),
        )));

        let band = f64::from(self.band) * scale;
        let first = (f64::from(rect.y) / band).floor() as i64;
        let last = (f64::from(rect.bottom()) / band).ceil() as i64;
        for i in first..last {
            let y0 = (i as f64 * band).max(f64::from(rect.y));
            let y1 = ((i + 1) as f64 * band).min(f64::from(rect.bottom()));
            if y1 <= y0 {
                continue;
            }
            let c = self.colors[(i.rem_euclid(self.colors.len() as i64)) as usize];
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                f64::from(rect.x),
                y0,
                f64::from(rect.right()),
                y1,
            ));
        }
        ctx.flush();
        ctx.render_to_pixmap(target);
        self.ctx = Some(ctx);
        Ok(())
    }
}

/// Observes a [`CoordinateContent`] after it was handed to a store.
#[derive(Clone, Debug, Default)]
pub struct CoordinateProbe {
    generation: Arc<AtomicU32>,
    paints: Arc<AtomicU64>,
    painted: Arc<Mutex<Vec<IntRect>>>,
}

impl CoordinateProbe {
    /// Change the content; pixels painted from now on differ from earlier ones.
    pub fn set_generation(&self, g: u32) {
        self.generation.store(g, Ordering::Release);
    }

    /// Number of `paint` calls so far.
    pub fn paints(&self) -> u64 {
        self.paints.load(Ordering::Acquire)
    }

    /// Every rect painted so far, in call order.
    pub fn painted_rects(&self) -> Vec<IntRect> {
        self.painted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Forget the painted-rect log.
    pub fn clear_log(&self) {
        self.painted.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Content whose every pixel encodes its own content coordinate.
///
/// Lets callers check exactly which content point a displayed pixel came from.
#[derive(Debug)]
pub struct CoordinateContent {
    size: IntSize,
    probe: CoordinateProbe,
}

impl CoordinateContent {
    /// Create content of `size` and the probe observing it.
    pub fn new(size: IntSize) -> (Self, CoordinateProbe) {
        let probe = CoordinateProbe::default();
        (
            Self {
                size,
                probe: probe.clone(),
            },
            probe,
        )
    }

    /// Pixel value painted for content point `(x, y)` at `generation`.
    pub fn expected(x: i32, y: i32, generation: u32) -> [u8; 4] {
        let hi = ((((x >> 8) & 0xf) << 4) | ((y >> 8) & 0xf)) as u8;
        [(x & 0xff) as u8 ^ generation as u8, (y & 0xff) as u8, hi, 0xff]
    }
}

impl ContentRenderer for CoordinateContent {
    fn contents_size(&self) -> IntSize {
        self.size
    }

    fn paint(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        target_origin: IntPoint,
        rect: IntRect,
        _scale: f64,
    ) -> TileStoreResult<()> {
        let generation = self.probe.generation.load(Ordering::Acquire);
        let w = i32::from(target.width());
        let h = i32::from(target.height());
        let local = rect
            .translate(-target_origin.x, -target_origin.y)
            .intersect(IntRect::new(0, 0, w, h));
        let data = target.data_as_u8_slice_mut();
        for ly in local.y..local.bottom() {
            for lx in local.x..local.right() {
                let i = ((ly * w + lx) * 4) as usize;
                let px = Self::expected(lx + target_origin.x, ly + target_origin.y, generation);
                data[i..i + 4].copy_from_slice(&px);
            }
        }
        self.probe.paints.fetch_add(1, Ordering::AcqRel);
        self.probe
            .painted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(rect);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/content.rs"]
mod tests;
