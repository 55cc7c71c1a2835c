use crate::compositor::{CompositeFrame, CompositeTile};
use crate::config::TileStoreConfig;
use crate::content::ContentRenderer;
use crate::dispatch::DisplayHandle;
use crate::foundation::core::{IntPoint, IntRect, IntSize, Rgba8Premul};
use crate::foundation::error::TileStoreResult;
use crate::foundation::region::Region;
use crate::geometry::divisor::{Axis, grid_shape_for};
use crate::geometry::grid::{GridPlacement, compute_grid_rect};
use crate::geometry::reassign::reassign_tiles;
use crate::geometry::state::{GeometryPair, GeometryState};
use crate::schedule::job::{JobClass, RenderJob};
use crate::schedule::queue::{PassReport, RenderScheduler, SchedulerStats};
use crate::surface::buffer::{BufferRole, DoubleBuffer};
use crate::surface::lease::{PoolLease, SharedPool, StoreId};
use crate::surface::pool::{SurfacePool, SurfacePoolStats};
use crate::surface::tile::{TileId, TileShift};
use crate::swap::SwapCoordinator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Counters describing what a backing store has done.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct BackingStoreStats {
    /// Render passes that painted through tiles or the direct snapshot.
    pub render_passes: u64,
    /// Tile pieces (or direct snapshot pieces) painted.
    pub pieces_painted: u64,
    /// Paint calls the content renderer failed.
    pub paint_failures: u64,
    /// Grid rebuilds from scratch.
    pub full_resets: u64,
    /// Grid moves or reshapes that reassigned tiles.
    pub grid_moves: u64,
    /// Tiles that kept their content across grid moves.
    pub tiles_kept: u64,
    /// Tiles moved to cells they hold no content for.
    pub tiles_relocated: u64,
    /// Stale areas cleared and queued again after a grid move.
    pub stale_requeued: u64,
    /// Tile composites posted to the display.
    pub composites_posted: u64,
    /// Direct snapshot presents posted to the display.
    pub direct_presents: u64,
    /// Geometry changes deferred because another store held the pool.
    pub deferred_while_inactive: u64,
    /// Swap commits that flipped at least one tile.
    pub swap_commits: u64,
    /// Tiles flipped across all commits.
    pub swap_flips: u64,
    /// Scheduler counters.
    pub scheduler: SchedulerStats,
    /// Pool counters, present while this store holds the lease.
    pub pool: Option<SurfacePoolStats>,
}

/// Public view of one grid cell, for inspection and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileState {
    /// Pool tile.
    pub id: TileId,
    /// Cell rectangle in content space.
    pub cell: IntRect,
    /// Whether the tile's pixels belong to `cell`.
    pub committed: bool,
    /// Offset to the cell the pixels belong to, in tiles.
    pub shift: TileShift,
    /// Valid front pixels, tile-local.
    pub front_region: Region,
}

/// Tiled backing store for one page: geometry, scheduling and buffer commits over a shared pool.
///
/// All methods run on the content context. Pixels reach the display only through tasks posted
/// on the [`DisplayHandle`]. Failures inside render, scroll, resize and blit are logged and the
/// operation degrades to doing nothing; only construction reports errors.
pub struct BackingStore {
    id: StoreId,
    config: TileStoreConfig,
    renderer: Box<dyn ContentRenderer>,
    display: DisplayHandle,
    shared: Arc<SharedPool>,
    lease: Option<PoolLease>,
    geometry: GeometryPair,
    scheduler: RenderScheduler,
    swap: SwapCoordinator,
    viewport: IntSize,
    scroll: IntPoint,
    scale: f64,
    content: IntSize,
    preferred_axis: Axis,
    suspend_depth: u32,
    reset_when_shown: bool,
    zoom_when_shown: bool,
    geometry_dirty: bool,
    // Scroll movement accumulated while geometry updates were deferred.
    deferred_delta: IntPoint,
    stats: BackingStoreStats,
}

impl BackingStore {
    /// Create an inactive store. Call [`BackingStore::acquire_lease`] before rendering.
    pub fn new(
        config: TileStoreConfig,
        renderer: Box<dyn ContentRenderer>,
        display: DisplayHandle,
        shared: Arc<SharedPool>,
    ) -> TileStoreResult<Self> {
        config.validate()?;
        let content = renderer.contents_size();
        let mut scheduler = RenderScheduler::new(&config);
        scheduler.set_content_size(content);
        Ok(Self {
            id: StoreId::next(),
            config,
            renderer,
            display,
            shared,
            lease: None,
            geometry: GeometryPair::default(),
            scheduler,
            swap: SwapCoordinator::new(),
            viewport: IntSize::default(),
            scroll: IntPoint::ZERO,
            scale: 1.0,
            content,
            preferred_axis: Axis::Vertical,
            suspend_depth: 0,
            reset_when_shown: true,
            zoom_when_shown: false,
            geometry_dirty: false,
            deferred_delta: IntPoint::ZERO,
            stats: BackingStoreStats::default(),
        })
    }

    /// This store's identity on the shared pool.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Take the shared pool, revoking any other store's lease.
    ///
    /// The grid is rebuilt unless the tiles still hold this store's content and nothing was
    /// deferred while it was inactive.
    pub fn acquire_lease(&mut self) {
        let (lease, acquired) = self.shared.acquire(self.id);
        self.lease = Some(lease);
        if !acquired.content_retained {
            self.reset_when_shown = true;
        }
        tracing::debug!(store = ?self.id, revoked = ?acquired.revoked, "pool lease acquired");
        self.show();
    }

    /// Give the pool up. Later operations are deferred until the lease is acquired again.
    pub fn release_lease(&mut self) {
        if self.lease.take().is_some() {
            self.swap.discard();
            tracing::debug!(store = ?self.id, "pool lease released");
        }
    }

    /// Return `true` while this store holds a valid lease.
    pub fn is_active(&self) -> bool {
        self.lease.as_ref().is_some_and(|l| l.is_valid())
    }

    /// Return `true` when the pool has no tiles and the store paints the viewport directly.
    pub fn is_direct_rendering(&self) -> bool {
        match self.lease.as_ref().map(|l| l.pool()) {
            Some(Ok(pool)) => pool.is_initialized() && pool.is_empty(),
            _ => false,
        }
    }

    /// Display viewport size.
    pub fn viewport_size(&self) -> IntSize {
        self.viewport
    }

    /// Current scroll offset in content space.
    pub fn scroll_position(&self) -> IntPoint {
        self.scroll
    }

    /// Current zoom scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scaled content size.
    pub fn content_size(&self) -> IntSize {
        self.content
    }

    /// Content-space rectangle currently shown.
    pub fn visible_rect(&self) -> IntRect {
        IntRect::from_origin_size(self.scroll, self.viewport)
            .intersect(IntRect::from_size(self.content))
    }

    /// Authoritative geometry.
    pub fn geometry(&self) -> &GeometryState {
        self.geometry.front()
    }

    /// Job queues, for inspection.
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Resize the display viewport.
    pub fn set_viewport_size(&mut self, size: IntSize) {
        if size == self.viewport {
            return;
        }
        self.viewport = size;
        if let Err(e) = self.display.post(move |c| {
            if let Err(e) = c.resize_surface(size) {
                tracing::warn!(error = %e, "display surface resize failed");
            }
        }) {
            tracing::warn!(error = %e, "could not post surface resize");
        }
        self.scroll = self.clamp_scroll(self.scroll);
        self.geometry_changed(IntPoint::ZERO);
    }

    /// Scroll so that `p` is the top-left visible content point (clamped to the content).
    pub fn scroll_to(&mut self, p: IntPoint) {
        let next = self.clamp_scroll(p);
        let delta = IntPoint::new(next.x - self.scroll.x, next.y - self.scroll.y);
        if delta == IntPoint::ZERO {
            return;
        }
        self.scroll = next;
        if delta.x.abs() > delta.y.abs() {
            self.preferred_axis = Axis::Horizontal;
        } else if delta.y != 0 {
            self.preferred_axis = Axis::Vertical;
        }
        self.geometry_changed(delta);
    }

    /// Zoom to `scale`. Every tile is invalidated; the visible area is queued as VisibleZoom.
    pub fn set_scale(&mut self, scale: f64) {
        if !(scale.is_finite() && scale > 0.0) {
            tracing::warn!(scale, "ignoring invalid scale");
            return;
        }
        if (scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let center = IntPoint::new(
            self.scroll.x + self.viewport.width / 2,
            self.scroll.y + self.viewport.height / 2,
        );
        let ratio = scale / self.scale;
        self.scale = scale;
        self.content = self.renderer.contents_size().scale_ceil(scale);
        self.scheduler.set_content_size(self.content);

        let c = IntPoint::new(
            (f64::from(center.x) * ratio).round() as i32,
            (f64::from(center.y) * ratio).round() as i32,
        );
        self.scroll = self.clamp_scroll(IntPoint::new(
            c.x - self.viewport.width / 2,
            c.y - self.viewport.height / 2,
        ));

        if !self.check_lease() {
            self.zoom_when_shown = true;
            self.defer_inactive();
            return;
        }
        if self.suspend_depth > 0 {
            self.reset_when_shown = true;
            self.zoom_when_shown = true;
            return;
        }
        self.full_reset(JobClass::VisibleZoom, false);
    }

    /// Re-read the content size from the renderer (unscaled size changed).
    pub fn contents_size_changed(&mut self) {
        let next = self.renderer.contents_size().scale_ceil(self.scale);
        if next == self.content {
            return;
        }
        self.content = next;
        self.scheduler.set_content_size(next);
        self.scroll = self.clamp_scroll(self.scroll);
        self.geometry_changed(IntPoint::ZERO);
    }

    /// Mark `rect` (content space) as needing a repaint.
    ///
    /// Recorded even while suspended or inactive.
    pub fn invalidate(&mut self, rect: IntRect) {
        self.scheduler.add_job(JobClass::Regular, rect);
        self.scheduler.arm_fallback(Instant::now());
    }

    /// Mark `rect` in unscaled document coordinates as needing a repaint.
    pub fn invalidate_document(&mut self, rect: IntRect) {
        self.invalidate(rect.scale_round_out(self.scale));
    }

    /// Stop render passes, geometry updates and the fallback timer. Nests.
    pub fn suspend_updates(&mut self) {
        self.suspend_depth = self.suspend_depth.saturating_add(1);
        if self.suspend_depth == 1 {
            tracing::debug!(store = ?self.id, "updates suspended");
        }
    }

    /// Undo one [`BackingStore::suspend_updates`]; the outermost call applies deferred work.
    pub fn resume_updates(&mut self) {
        if self.suspend_depth == 0 {
            return;
        }
        self.suspend_depth -= 1;
        if self.suspend_depth == 0 {
            tracing::debug!(store = ?self.id, "updates resumed");
            self.show();
            self.scheduler.arm_fallback(Instant::now());
        }
    }

    /// Return `true` while updates are suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspend_depth > 0
    }

    /// Run one render pass now.
    pub fn render(&mut self, allow_regular: bool) -> PassReport {
        self.render_at(allow_regular, Instant::now())
    }

    /// Host heartbeat: run a pass if work is queued, then blit.
    pub fn tick(&mut self, now: Instant) -> PassReport {
        self.scheduler.tick(now);
        let report = if self.scheduler.has_pending() {
            self.render_at(true, now)
        } else {
            PassReport::default()
        };
        self.blit_visible();
        report
    }

    /// Fire the fallback pass if queued work waited too long. Returns `true` when it fired.
    pub fn service_timers(&mut self, now: Instant) -> bool {
        if self.suspend_depth > 0 || !self.check_lease() {
            return false;
        }
        if !self.scheduler.poll_fallback(now) {
            return false;
        }
        tracing::debug!(store = ?self.id, "running fallback render pass");
        self.render_at(true, now);
        self.blit_visible();
        true
    }

    /// Post the current front buffers (or the direct snapshot) to the display.
    pub fn blit_visible(&mut self) {
        if self.suspend_depth > 0 || !self.check_lease() {
            return;
        }
        let visible = self.visible_rect();
        if visible.is_empty() {
            return;
        }
        let Some(lease) = self.lease.as_ref() else {
            return;
        };
        let pool = match lease.pool() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "blit skipped");
                return;
            }
        };

        if pool.is_empty() {
            let Some(snapshot) = pool.visible_snapshot().cloned() else {
                return;
            };
            drop(pool);
            self.post_direct(visible, snapshot);
            return;
        }

        let frame = composite_frame(&pool, self.geometry.front(), visible);
        drop(pool);
        match self.display.post(move |c| {
            if let Err(e) = c.composite(&frame) {
                tracing::warn!(error = %e, "composite failed");
            }
        }) {
            Ok(()) => self.stats.composites_posted += 1,
            Err(e) => tracing::warn!(error = %e, "could not post composite"),
        }
    }

    /// Release display resources synchronously; nothing is drawn until the next blit.
    pub fn destroy_display_resources(&mut self) {
        if let Err(e) = self.display.post_sync(|c| c.destroy_resources()) {
            tracing::warn!(error = %e, "could not destroy display resources");
        }
    }

    /// Cell states in row-major order.
    pub fn tile_states(&self) -> Vec<TileState> {
        let Some(Ok(pool)) = self.lease.as_ref().map(|l| l.pool()) else {
            return Vec::new();
        };
        let geo = self.geometry.front();
        geo.tiles()
            .iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let tile = pool.tile(*id)?;
                Some(TileState {
                    id: *id,
                    cell: geo.tile_rect(i),
                    committed: tile.is_committed(),
                    shift: tile.shift(),
                    front_region: tile.front_region(),
                })
            })
            .collect()
    }

    /// Counters.
    pub fn stats(&self) -> BackingStoreStats {
        let mut s = self.stats.clone();
        s.scheduler = self.scheduler.stats();
        s.swap_commits = self.swap.commits();
        s.swap_flips = self.swap.flips();
        s.pool = match self.lease.as_ref().map(|l| l.pool()) {
            Some(Ok(pool)) => Some(pool.stats()),
            _ => None,
        };
        s
    }

    fn clamp_scroll(&self, p: IntPoint) -> IntPoint {
        let max_x = (self.content.width - self.viewport.width).max(0);
        let max_y = (self.content.height - self.viewport.height).max(0);
        IntPoint::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
    }

    // Returns `false` (and drops a revoked lease) when this store may not touch the pool.
    fn check_lease(&mut self) -> bool {
        match &self.lease {
            Some(l) if l.is_valid() => true,
            Some(_) => {
                tracing::debug!(store = ?self.id, "pool lease was revoked");
                self.lease = None;
                self.swap.discard();
                self.reset_when_shown = true;
                false
            }
            None => false,
        }
    }

    fn defer_inactive(&mut self) {
        self.reset_when_shown = true;
        self.stats.deferred_while_inactive += 1;
    }

    // Apply deferred work once active and not suspended.
    fn show(&mut self) {
        if self.suspend_depth > 0 || !self.check_lease() {
            return;
        }
        if self.reset_when_shown {
            self.full_reset(self.deferred_reset_class(), true);
        } else if self.geometry_dirty {
            let delta = std::mem::replace(&mut self.deferred_delta, IntPoint::ZERO);
            self.update_geometry(delta);
        }
    }

    fn geometry_changed(&mut self, delta: IntPoint) {
        if !self.check_lease() {
            self.defer_inactive();
            return;
        }
        if self.suspend_depth > 0 {
            self.geometry_dirty = true;
            self.deferred_delta = self
                .deferred_delta
                .offset(delta.x.signum(), delta.y.signum());
            return;
        }
        if self.reset_when_shown {
            self.full_reset(self.deferred_reset_class(), true);
            return;
        }
        self.update_geometry(delta);
    }

    fn deferred_reset_class(&self) -> JobClass {
        if self.zoom_when_shown {
            JobClass::VisibleZoom
        } else {
            JobClass::VisibleScroll
        }
    }

    fn placement(&self, grid_size: IntSize, delta: IntPoint) -> GridPlacement {
        GridPlacement {
            visible: self.visible_rect(),
            content: self.content,
            tile: self.config.tile_size,
            grid_size,
            delta,
        }
    }

    /// Rebuild the grid from scratch and queue the whole of it.
    #[tracing::instrument(skip(self), fields(store = ?self.id))]
    fn full_reset(&mut self, visible_class: JobClass, clear_background: bool) {
        self.reset_when_shown = false;
        self.zoom_when_shown = false;
        self.geometry_dirty = false;
        self.deferred_delta = IntPoint::ZERO;
        self.scheduler.clear_all();
        self.swap.discard();
        self.stats.full_resets += 1;

        let visible = self.visible_rect();
        let placement = self.placement(IntSize::default(), IntPoint::ZERO);
        let Some(lease) = self.lease.as_ref() else {
            return;
        };
        let mut pool = match lease.pool() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "grid reset skipped");
                self.reset_when_shown = true;
                self.zoom_when_shown = visible_class == JobClass::VisibleZoom;
                return;
            }
        };
        pool.initialize(self.config.tile_size);

        if self.content.is_empty() || self.viewport.is_empty() {
            self.geometry.clear();
            return;
        }
        if pool.is_empty() {
            self.geometry.clear();
            reset_direct_snapshot(&mut pool, self.viewport);
            self.scheduler.add_job(visible_class, visible);
            return;
        }

        pool.reset_all(clear_background);
        let tile = self.config.tile_size;
        let Some(shape) = grid_shape_for(
            self.content,
            self.viewport,
            tile,
            pool.len(),
            self.config.min_visible_tile_margin,
            self.preferred_axis,
        ) else {
            return;
        };
        let grid = compute_grid_rect(
            None,
            &GridPlacement {
                grid_size: shape.pixel_size(tile),
                ..placement
            },
        );
        let ids: Vec<TileId> = pool.tiles().iter().map(|t| t.id()).collect();
        self.geometry
            .publish(GeometryState::new(grid.origin(), shape, tile, ids));
        tracing::debug!(
            wide = shape.wide,
            high = shape.high,
            x = grid.x,
            y = grid.y,
            "grid rebuilt"
        );
        queue_missing(
            &pool,
            self.geometry.front(),
            &mut self.scheduler,
            visible,
            IntRect::from_size(self.content),
            visible_class,
        );
    }

    /// Move or reshape the grid for the current viewport and content, keeping what it can.
    #[tracing::instrument(skip(self), fields(store = ?self.id))]
    fn update_geometry(&mut self, delta: IntPoint) {
        self.geometry_dirty = false;
        self.deferred_delta = IntPoint::ZERO;
        if self.content.is_empty() || self.viewport.is_empty() {
            return;
        }
        if self.geometry.front().is_empty() {
            self.full_reset(JobClass::VisibleScroll, false);
            return;
        }

        let visible = self.visible_rect();
        let tile = self.config.tile_size;
        let placement = self.placement(IntSize::default(), delta);
        let Some(lease) = self.lease.as_ref() else {
            return;
        };
        let mut pool = match lease.pool() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "geometry update skipped");
                self.geometry_dirty = true;
                return;
            }
        };

        let Some(shape) = grid_shape_for(
            self.content,
            self.viewport,
            tile,
            pool.len(),
            self.config.min_visible_tile_margin,
            self.preferred_axis,
        ) else {
            return;
        };
        let front = self.geometry.front();
        let grid = compute_grid_rect(
            Some(front.grid_rect()),
            &GridPlacement {
                grid_size: shape.pixel_size(tile),
                ..placement
            },
        );

        if grid.origin() != front.origin() || shape != front.grid() {
            let scheduler = &self.scheduler;
            let outcome = reassign_tiles(front, grid.origin(), shape, pool.tiles_mut(), |cell| {
                scheduler.attempted_in(cell)
            });
            for r in &outcome.stale {
                self.scheduler.forget_attempted(*r);
                self.scheduler.requeue_job(JobClass::Regular, *r);
            }
            self.stats.grid_moves += 1;
            self.stats.tiles_kept += outcome.kept as u64;
            self.stats.tiles_relocated += outcome.relocated as u64;
            self.stats.stale_requeued += outcome.stale.len() as u64;
            tracing::debug!(
                x = grid.x,
                y = grid.y,
                kept = outcome.kept,
                relocated = outcome.relocated,
                "grid moved"
            );
            self.geometry.publish(outcome.state);
        }

        self.scheduler.clip_to_grid(self.geometry.front().grid_rect());
        queue_missing(
            &pool,
            self.geometry.front(),
            &mut self.scheduler,
            visible,
            IntRect::from_size(self.content),
            JobClass::VisibleScroll,
        );
        self.scheduler.promote_visible(visible);
        self.scheduler.arm_fallback(Instant::now());
    }

    #[tracing::instrument(skip(self), fields(store = ?self.id))]
    fn render_at(&mut self, allow_regular: bool, now: Instant) -> PassReport {
        if !self.check_lease() {
            self.reset_when_shown = true;
            return PassReport::default();
        }
        if self.suspend_depth > 0 {
            return PassReport::default();
        }
        self.show();
        if self.content.is_empty() || self.viewport.is_empty() || !self.scheduler.has_pending() {
            return PassReport::default();
        }
        if let Err(e) = self.renderer.update_layout() {
            tracing::warn!(error = %e, "layout update failed, skipping render pass");
            return PassReport::default();
        }

        let visible = self.visible_rect();
        let Some(lease) = self.lease.as_ref() else {
            return PassReport::default();
        };
        let mut pool = match lease.pool() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "render pass skipped");
                return PassReport::default();
            }
        };
        self.stats.render_passes += 1;

        if pool.is_empty() {
            let snapshot = match pool.ensure_visible_snapshot(self.viewport) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "direct snapshot unavailable");
                    return PassReport::default();
                }
            };
            drop(pool);
            let mut direct = DirectPass {
                renderer: self.renderer.as_mut(),
                snapshot: &snapshot,
                visible,
                scale: self.scale,
                stats: &mut self.stats,
            };
            let report = self
                .scheduler
                .render(allow_regular, now, |job| direct.paint_job(job));
            self.post_direct(visible, snapshot);
            return report;
        }

        self.scheduler.clip_to_grid(self.geometry.front().grid_rect());
        let mut pass = TilePass {
            renderer: self.renderer.as_mut(),
            pool: &mut pool,
            geometry: self.geometry.front(),
            swap: &mut self.swap,
            touched: HashMap::new(),
            background: self.config.background,
            content: IntRect::from_size(self.content),
            scale: self.scale,
            stats: &mut self.stats,
        };
        let report = self
            .scheduler
            .render(allow_regular, now, |job| pass.paint_job(job));
        drop(pass);
        drop(pool);

        let flipped = self.swap.commit(&self.display);
        tracing::trace!(
            painted = report.total(),
            requeued = report.requeued,
            flipped,
            "render pass done"
        );
        report
    }

    fn post_direct(&mut self, visible: IntRect, snapshot: Arc<DoubleBuffer>) {
        match self.display.post(move |c| {
            if let Err(e) = c.present_direct(visible, &snapshot) {
                tracing::warn!(error = %e, "direct present failed");
            }
        }) {
            Ok(()) => self.stats.direct_presents += 1,
            Err(e) => tracing::warn!(error = %e, "could not post direct present"),
        }
    }
}

impl std::fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackingStore")
            .field("id", &self.id)
            .field("viewport", &self.viewport)
            .field("scroll", &self.scroll)
            .field("scale", &self.scale)
            .field("content", &self.content)
            .field("active", &self.is_active())
            .field("suspend_depth", &self.suspend_depth)
            .finish_non_exhaustive()
    }
}

fn reset_direct_snapshot(pool: &mut SurfacePool, viewport: IntSize) {
    match pool.ensure_visible_snapshot(viewport) {
        Ok(s) => s.with_back_mut(|b| b.clear_all_rendered()),
        Err(e) => tracing::warn!(error = %e, "direct snapshot unavailable"),
    }
}

// Queue every cell area that holds no valid pixels: visible parts as `visible_class`, the rest
// as NonVisibleScroll.
fn queue_missing(
    pool: &SurfacePool,
    geo: &GeometryState,
    scheduler: &mut RenderScheduler,
    visible: IntRect,
    content: IntRect,
    visible_class: JobClass,
) {
    for (i, id) in geo.tiles().iter().enumerate() {
        let Some(tile) = pool.tile(*id) else {
            continue;
        };
        let cell = geo.tile_rect(i);
        let mut missing = Region::from_rect(cell.intersect(content));
        if tile.is_committed() {
            missing.subtract_region(&tile.front_region().translate(cell.x, cell.y));
        }
        for r in missing.rects() {
            scheduler.forget_attempted(*r);
            let inside = r.intersect(visible);
            if !inside.is_empty() {
                scheduler.add_job(visible_class, inside);
            }
            let mut rest = Region::from_rect(*r);
            rest.subtract_rect(visible);
            for o in rest.rects() {
                scheduler.add_job(JobClass::NonVisibleScroll, *o);
            }
        }
    }
}

fn composite_frame(pool: &SurfacePool, geo: &GeometryState, visible: IntRect) -> CompositeFrame {
    let tw = geo.tile_size().width;
    let th = geo.tile_size().height;
    let mut tiles = Vec::new();
    for (i, id) in geo.tiles().iter().enumerate() {
        let Some(tile) = pool.tile(*id) else {
            continue;
        };
        let cell = geo.tile_rect(i);
        let shift = tile.shift();
        let origin = if tile.is_committed() {
            cell.origin()
        } else {
            cell.origin().offset(shift.dx * tw, shift.dy * th)
        };
        if !IntRect::from_origin_size(origin, geo.tile_size()).intersects(visible) {
            continue;
        }
        tiles.push(CompositeTile {
            id: *id,
            buffers: Arc::clone(tile.buffers()),
            content_origin: origin,
            committed: tile.is_committed(),
        });
    }
    CompositeFrame {
        viewport: visible,
        tiles,
    }
}

/// Borrowed state for painting one pass through the tile pool.
struct TilePass<'a> {
    renderer: &'a mut dyn ContentRenderer,
    pool: &'a mut SurfacePool,
    geometry: &'a GeometryState,
    swap: &'a mut SwapCoordinator,
    // Tile -> whether its front pixels belonged to its cell when the pass first touched it.
    touched: HashMap<TileId, bool>,
    background: Rgba8Premul,
    content: IntRect,
    scale: f64,
    stats: &'a mut BackingStoreStats,
}

impl TilePass<'_> {
    fn paint_job(&mut self, job: &RenderJob) -> Region {
        let mut leftover = Region::new();
        for (_, id, cell) in self.geometry.tiles_in_rect(job.rect) {
            let piece = job.rect.intersect(cell).intersect(self.content);
            if piece.is_empty() {
                continue;
            }
            let local = piece.translate(-cell.x, -cell.y);
            let Some((tile, scratch)) = self.pool.tile_and_scratch_mut(id) else {
                leftover.add_rect(piece);
                continue;
            };

            let had_front = match self.touched.get(&id).copied() {
                Some(had) => had,
                None => {
                    let had = tile.is_committed();
                    tile.paint_background(self.background);
                    if had {
                        tile.copy_forward(local);
                    } else {
                        tile.buffers().with_back_mut(|b| b.clear_all_rendered());
                        tile.commit();
                    }
                    self.swap.add(id, tile.buffers());
                    self.touched.insert(id, had);
                    had
                }
            };

            match self.renderer.paint(scratch, cell.origin(), piece, self.scale) {
                Ok(()) => {
                    tile.buffers().with_back_mut(|b| {
                        b.copy_from(scratch, local);
                        b.add_rendered_region(local);
                    });
                    self.stats.pieces_painted += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, class = ?job.class, "tile paint failed");
                    self.stats.paint_failures += 1;
                    if had_front {
                        // Keep whatever the front still had there.
                        tile.copy_forward(IntRect::default());
                    }
                    leftover.add_rect(piece);
                }
            }
        }
        leftover
    }
}

/// Borrowed state for painting one pass straight into the visible snapshot.
struct DirectPass<'a> {
    renderer: &'a mut dyn ContentRenderer,
    snapshot: &'a DoubleBuffer,
    visible: IntRect,
    scale: f64,
    stats: &'a mut BackingStoreStats,
}

impl DirectPass<'_> {
    fn paint_job(&mut self, job: &RenderJob) -> Region {
        let piece = job.rect.intersect(self.visible);
        if piece.is_empty() {
            return Region::new();
        }
        let origin = self.visible.origin();
        let local = piece.translate(-origin.x, -origin.y);
        let renderer = &mut *self.renderer;
        let scale = self.scale;
        let res = self.snapshot.with_buffer_mut(BufferRole::Back, |b| {
            renderer.paint(b.pixmap_mut(), origin, piece, scale)?;
            b.add_rendered_region(local);
            Ok::<(), crate::foundation::error::TileStoreError>(())
        });
        match res {
            Ok(()) => {
                self.stats.pieces_painted += 1;
                Region::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "direct paint failed");
                self.stats.paint_failures += 1;
                Region::from_rect(piece)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/store.rs"]
mod tests;
