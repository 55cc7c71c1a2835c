use crate::foundation::core::IntRect;
use crate::foundation::region::subtract_rect;

/// Render job priority, highest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum JobClass {
    /// Visible content being re-rendered at a new scale.
    VisibleZoom,
    /// Visible content newly exposed by scrolling.
    VisibleScroll,
    /// Off-screen content newly covered by the grid.
    NonVisibleScroll,
    /// Ordinary invalidation.
    Regular,
}

impl JobClass {
    /// Every class in pass order.
    pub const ALL: [JobClass; 4] = [
        JobClass::VisibleZoom,
        JobClass::VisibleScroll,
        JobClass::NonVisibleScroll,
        JobClass::Regular,
    ];

    /// Position in [`JobClass::ALL`].
    pub fn index(self) -> usize {
        match self {
            JobClass::VisibleZoom => 0,
            JobClass::VisibleScroll => 1,
            JobClass::NonVisibleScroll => 2,
            JobClass::Regular => 3,
        }
    }

    /// Return `true` for the classes drained before anything else.
    pub fn is_visible(self) -> bool {
        matches!(self, JobClass::VisibleZoom | JobClass::VisibleScroll)
    }
}

/// A pending content-space rectangle and its priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderJob {
    /// Content-space rectangle to paint.
    pub rect: IntRect,
    /// Priority class.
    pub class: JobClass,
}

/// Rectangles of one priority class, kept coalesced.
///
/// Insertion drops rectangles already covered, removes rectangles the new one covers, and
/// merges pairs whose bounding box is no larger than their combined area.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobList {
    rects: Vec<IntRect>,
}

impl JobList {
    /// Pending rectangles in queue order.
    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }

    /// Return `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of queued rectangles.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Queue `r`; returns `false` when it was empty or already covered.
    pub fn add(&mut self, r: IntRect) -> bool {
        if r.is_empty() || self.rects.iter().any(|e| e.contains_rect(r)) {
            return false;
        }
        let mut cur = r;
        loop {
            self.rects.retain(|e| !cur.contains_rect(*e));
            let merge = self.rects.iter().position(|e| {
                let u = cur.union(*e);
                u.area() <= cur.area() + e.area()
            });
            match merge {
                Some(i) => {
                    let e = self.rects.swap_remove(i);
                    cur = cur.union(e);
                }
                None => break,
            }
        }
        self.rects.push(cur);
        true
    }

    /// Remove the pixels of `r` from every queued rectangle.
    pub fn subtract(&mut self, r: IntRect) {
        if r.is_empty() {
            return;
        }
        self.rects = self
            .rects
            .iter()
            .flat_map(|e| subtract_rect(*e, r))
            .collect();
    }

    /// Clip every rectangle to `bounds`, dropping the ones left empty.
    pub fn clamp(&mut self, bounds: IntRect) {
        self.rects = self
            .rects
            .iter()
            .map(|r| r.intersect(bounds))
            .filter(|r| !r.is_empty())
            .collect();
    }

    /// Split every rectangle at `bounds`: parts inside stay queued, parts outside are returned.
    pub fn retain_within(&mut self, bounds: IntRect) -> Vec<IntRect> {
        let mut outside = Vec::new();
        let mut inside = Vec::with_capacity(self.rects.len());
        for r in &self.rects {
            let i = r.intersect(bounds);
            if !i.is_empty() {
                inside.push(i);
            }
            outside.extend(subtract_rect(*r, bounds));
        }
        self.rects = inside;
        outside
    }

    /// Remove and return the parts of queued rectangles that lie inside `bounds`.
    pub fn take_within(&mut self, bounds: IntRect) -> Vec<IntRect> {
        let mut taken = Vec::new();
        let mut rest = Vec::with_capacity(self.rects.len());
        for r in &self.rects {
            let i = r.intersect(bounds);
            if !i.is_empty() {
                taken.push(i);
            }
            rest.extend(subtract_rect(*r, bounds));
        }
        self.rects = rest;
        taken
    }

    /// Remove and return up to `n` rectangles from the front of the queue.
    pub fn take_front(&mut self, n: usize) -> Vec<IntRect> {
        let n = n.min(self.rects.len());
        self.rects.drain(..n).collect()
    }

    /// Remove and return everything.
    pub fn take_all(&mut self) -> Vec<IntRect> {
        std::mem::take(&mut self.rects)
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/job.rs"]
mod tests;
