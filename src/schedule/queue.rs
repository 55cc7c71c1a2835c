use crate::config::TileStoreConfig;
use crate::foundation::core::{IntRect, IntSize};
use crate::foundation::region::Region;
use crate::schedule::job::{JobClass, JobList, RenderJob};
use crate::schedule::timer::{FallbackTimer, PressureTracker};
use std::time::Instant;

/// Cumulative scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    /// Render passes run.
    pub passes: u64,
    /// Jobs fully painted.
    pub jobs_painted: u64,
    /// Jobs (or parts of jobs) re-queued after a failed paint.
    pub jobs_requeued: u64,
    /// Passes that drained the whole Regular batch because of pressure.
    pub pressure_drains: u64,
    /// Regular jobs clipped against the grid and recorded as attempted.
    pub regular_clipped: u64,
    /// Fallback passes triggered by the liveness timer.
    pub fallback_fires: u64,
}

/// What one render pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Jobs painted per class, indexed by [`JobClass::index`].
    pub painted: [usize; 4],
    /// Jobs that left unpainted area behind.
    pub requeued: usize,
    /// `true` when the Regular batch was drained in full because of pressure.
    pub pressure_drain: bool,
}

impl PassReport {
    /// Jobs of `class` painted in this pass.
    pub fn painted(&self, class: JobClass) -> usize {
        self.painted[class.index()]
    }

    /// Jobs painted across every class.
    pub fn total(&self) -> usize {
        self.painted.iter().sum()
    }
}

/// Per-priority queues of pending content rectangles.
///
/// Holds rectangles only; decomposing a job onto tiles is the caller's business (the paint
/// callback passed to [`RenderScheduler::render`]).
#[derive(Debug)]
pub struct RenderScheduler {
    lists: [JobList; 4],
    content: IntRect,
    attempted: Region,
    pressure: PressureTracker,
    fallback: FallbackTimer,
    stats: SchedulerStats,
}

impl RenderScheduler {
    /// Create an empty scheduler using the pressure and timer settings of `cfg`.
    pub fn new(cfg: &TileStoreConfig) -> Self {
        Self {
            lists: Default::default(),
            content: IntRect::default(),
            attempted: Region::new(),
            pressure: PressureTracker::new(cfg.pressure, cfg.tick_interval()),
            fallback: FallbackTimer::new(cfg.fallback_timeout()),
            stats: SchedulerStats::default(),
        }
    }

    /// Set the content bounds; queued jobs are clipped to them.
    pub fn set_content_size(&mut self, size: IntSize) {
        self.content = IntRect::from_size(size);
        for l in &mut self.lists {
            l.clamp(self.content);
        }
        self.attempted = self.attempted.intersect_rect(self.content);
    }

    /// Queue `rect` in `class`. Rectangles outside the content are clipped or dropped.
    ///
    /// Regular arrivals that survive clipping count towards the pressure window.
    pub fn add_job(&mut self, class: JobClass, rect: IntRect) {
        if self.push(class, rect) && class == JobClass::Regular {
            self.pressure.record_arrival();
        }
    }

    /// Queue `rect` again after the store dropped its pixels (stale area after a grid move).
    ///
    /// Same as [`RenderScheduler::add_job`] but never counted as a new Regular arrival.
    pub fn requeue_job(&mut self, class: JobClass, rect: IntRect) {
        self.push(class, rect);
    }

    fn push(&mut self, class: JobClass, rect: IntRect) -> bool {
        let r = rect.intersect(self.content);
        if r.is_empty() {
            return false;
        }
        self.lists[class.index()].add(r);
        true
    }

    /// Pending rectangles of `class`.
    pub fn pending(&self, class: JobClass) -> &[IntRect] {
        self.lists[class.index()].rects()
    }

    /// Return `true` when any class has work.
    pub fn has_pending(&self) -> bool {
        self.lists.iter().any(|l| !l.is_empty())
    }

    /// Return `true` when VisibleZoom or VisibleScroll work is queued.
    pub fn has_pending_visible_job(&self) -> bool {
        JobClass::ALL
            .iter()
            .filter(|c| c.is_visible())
            .any(|c| !self.lists[c.index()].is_empty())
    }

    /// Cancel not-yet-started work inside `rect`. Regular jobs are kept unless `clear_regular`.
    pub fn clear(&mut self, rect: IntRect, clear_regular: bool) {
        for class in JobClass::ALL {
            if class == JobClass::Regular && !clear_regular {
                continue;
            }
            self.lists[class.index()].subtract(rect);
        }
    }

    /// Drop every job and the attempted record (full grid reset).
    pub fn clear_all(&mut self) {
        for l in &mut self.lists {
            l.clear();
        }
        self.attempted.clear();
        self.pressure.reset();
        self.fallback.disarm();
    }

    /// Clip every queue to `grid`.
    ///
    /// Regular parts outside the grid are remembered as attempted-but-not-rendered; other classes
    /// are only ever queued for grid cells, so their outside parts are dropped.
    pub fn clip_to_grid(&mut self, grid: IntRect) {
        for class in JobClass::ALL {
            let outside = self.lists[class.index()].retain_within(grid);
            if class != JobClass::Regular || outside.is_empty() {
                continue;
            }
            self.stats.regular_clipped = self
                .stats
                .regular_clipped
                .saturating_add(outside.len() as u64);
            for r in outside {
                self.attempted.add_rect(r);
            }
        }
    }

    /// Return `true` if a Regular job touching `rect` was clipped away before it was painted.
    pub fn previously_attempted_but_not_rendered(&self, rect: IntRect) -> bool {
        self.attempted.intersects(rect)
    }

    /// Attempted-but-not-rendered area inside `rect`.
    pub fn attempted_in(&self, rect: IntRect) -> Region {
        self.attempted.intersect_rect(rect)
    }

    /// Forget attempted area inside `rect` (it has been queued again or will be fully repainted).
    pub fn forget_attempted(&mut self, rect: IntRect) {
        self.attempted.subtract_rect(rect);
    }

    /// Move NonVisibleScroll work inside `visible` to VisibleScroll.
    pub fn promote_visible(&mut self, visible: IntRect) {
        let promoted = self.lists[JobClass::NonVisibleScroll.index()].take_within(visible);
        for r in promoted {
            self.lists[JobClass::VisibleScroll.index()].add(r);
        }
    }

    /// Start the liveness timer if work is queued.
    pub fn arm_fallback(&mut self, now: Instant) {
        if self.has_pending() {
            self.fallback.arm(now);
        }
    }

    /// Return `true` once when queued work has waited past the fallback timeout.
    pub fn poll_fallback(&mut self, now: Instant) -> bool {
        if !self.has_pending() {
            self.fallback.disarm();
            return false;
        }
        let fired = self.fallback.poll(now);
        if fired {
            self.stats.fallback_fires = self.stats.fallback_fires.saturating_add(1);
            tracing::debug!("fallback render timer fired");
        }
        fired
    }

    /// Return `true` while Regular arrivals outpace draining.
    pub fn is_under_pressure(&self) -> bool {
        self.pressure.is_under_pressure()
    }

    /// Roll the pressure window without rendering.
    pub fn tick(&mut self, now: Instant) {
        self.pressure.roll(now);
    }

    /// Run one pass: VisibleZoom, VisibleScroll and NonVisibleScroll are drained in full, then
    /// Regular when `allow_regular` (a bounded batch, or everything under pressure).
    ///
    /// `paint` returns the part of the job it could not paint; non-empty leftovers are queued
    /// again in the same class. The fallback timer restarts if anything is still queued.
    pub fn render(
        &mut self,
        allow_regular: bool,
        now: Instant,
        mut paint: impl FnMut(&RenderJob) -> Region,
    ) -> PassReport {
        self.pressure.roll(now);
        self.fallback.disarm();
        self.stats.passes = self.stats.passes.saturating_add(1);

        let mut report = PassReport::default();
        for class in JobClass::ALL {
            let batch = match class {
                JobClass::Regular if !allow_regular => continue,
                JobClass::Regular if self.pressure.is_under_pressure() => {
                    report.pressure_drain = true;
                    self.stats.pressure_drains = self.stats.pressure_drains.saturating_add(1);
                    self.lists[class.index()].take_all()
                }
                JobClass::Regular => {
                    let n = self.pressure.batch_size();
                    self.lists[class.index()].take_front(n)
                }
                _ => self.lists[class.index()].take_all(),
            };

            let mut leftovers = Vec::new();
            for rect in batch {
                let job = RenderJob { rect, class };
                let rest = paint(&job);
                if rest.is_empty() {
                    report.painted[class.index()] += 1;
                } else {
                    report.requeued += 1;
                    leftovers.extend_from_slice(rest.rects());
                }
            }
            if class == JobClass::Regular {
                self.pressure.record_drained(report.painted[class.index()]);
            }
            for r in leftovers {
                self.lists[class.index()].add(r.intersect(self.content));
            }
        }

        if report.pressure_drain {
            self.pressure.relieve();
        }
        // Leftover work re-arms the liveness timer.
        self.arm_fallback(now);
        self.stats.jobs_painted = self
            .stats
            .jobs_painted
            .saturating_add(report.total() as u64);
        self.stats.jobs_requeued = self
            .stats
            .jobs_requeued
            .saturating_add(report.requeued as u64);
        report
    }

    /// Cumulative counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/queue.rs"]
mod tests;
