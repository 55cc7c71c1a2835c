use crate::foundation::core::IntRect;
use smallvec::SmallVec;

type RectList = SmallVec<[IntRect; 4]>;

/// A set of pixels represented as disjoint rectangles.
///
/// Used for "rendered region" bookkeeping and for the scheduler's record of clipped jobs. Region
/// sizes stay tiny in practice (a handful of rects per tile), so the quadratic algorithms below are
/// fine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    rects: RectList,
}

impl Region {
    /// Empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Region covering exactly `r`.
    pub fn from_rect(r: IntRect) -> Self {
        let mut out = Self::new();
        out.add_rect(r);
        out
    }

    /// Return `true` when no pixel is covered.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Disjoint rectangles making up the region.
    pub fn rects(&self) -> &[IntRect] {
        &self.rects
    }

    /// Covered pixel count.
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Bounding box, empty for an empty region.
    pub fn bounds(&self) -> IntRect {
        self.rects
            .iter()
            .fold(IntRect::default(), |acc, r| acc.union(*r))
    }

    /// Remove every pixel.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Add the pixels of `r`.
    pub fn add_rect(&mut self, r: IntRect) {
        if r.is_empty() {
            return;
        }
        let mut pieces: RectList = SmallVec::new();
        pieces.push(r);
        for existing in &self.rects {
            pieces = pieces
                .into_iter()
                .flat_map(|p| subtract_rect(p, *existing))
                .collect();
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
        self.coalesce();
    }

    /// Add every pixel of `other`.
    pub fn add_region(&mut self, other: &Region) {
        for r in other.rects() {
            self.add_rect(*r);
        }
    }

    /// Remove the pixels of `r`.
    pub fn subtract_rect(&mut self, r: IntRect) {
        if r.is_empty() || self.rects.is_empty() {
            return;
        }
        self.rects = self
            .rects
            .iter()
            .flat_map(|e| subtract_rect(*e, r))
            .collect();
        self.coalesce();
    }

    /// Remove every pixel of `other`.
    pub fn subtract_region(&mut self, other: &Region) {
        for r in other.rects() {
            self.subtract_rect(*r);
        }
    }

    /// Pixels of `self` that also lie in `r`.
    pub fn intersect_rect(&self, r: IntRect) -> Region {
        let mut out = Region::new();
        for e in &self.rects {
            let i = e.intersect(r);
            if !i.is_empty() {
                out.rects.push(i);
            }
        }
        out.coalesce();
        out
    }

    /// Pixels present in both regions.
    pub fn intersect_region(&self, other: &Region) -> Region {
        let mut out = Region::new();
        for r in other.rects() {
            out.add_region(&self.intersect_rect(*r));
        }
        out
    }

    /// Return `true` when any pixel of `r` is covered.
    pub fn intersects(&self, r: IntRect) -> bool {
        self.rects.iter().any(|e| e.intersects(r))
    }

    /// Return `true` when every pixel of `r` is covered.
    pub fn contains_rect(&self, r: IntRect) -> bool {
        if r.is_empty() {
            return true;
        }
        let mut rest: RectList = SmallVec::new();
        rest.push(r);
        for e in &self.rects {
            rest = rest
                .into_iter()
                .flat_map(|p| subtract_rect(p, *e))
                .collect();
            if rest.is_empty() {
                return true;
            }
        }
        rest.is_empty()
    }

    /// Return `true` when every pixel of `other` is covered.
    pub fn contains_region(&self, other: &Region) -> bool {
        other.rects().iter().all(|r| self.contains_rect(*r))
    }

    /// Move every rectangle by `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    // Merges pairs that share a full edge so regions built from row-by-row paints stay short.
    fn coalesce(&mut self) {
        loop {
            let mut merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(m) = merge_if_adjacent(self.rects[i], self.rects[j]) {
                        self.rects[i] = m;
                        self.rects.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
            if !merged {
                break;
            }
        }
    }
}

impl From<IntRect> for Region {
    fn from(r: IntRect) -> Self {
        Region::from_rect(r)
    }
}

/// `a` minus `b`, as at most four disjoint rectangles.
pub(crate) fn subtract_rect(a: IntRect, b: IntRect) -> RectList {
    let mut out = RectList::new();
    if a.is_empty() {
        return out;
    }
    let i = a.intersect(b);
    if i.is_empty() {
        out.push(a);
        return out;
    }

    let top = IntRect::from_edges(a.x, a.y, a.right(), i.y);
    let bottom = IntRect::from_edges(a.x, i.bottom(), a.right(), a.bottom());
    let left = IntRect::from_edges(a.x, i.y, i.x, i.bottom());
    let right = IntRect::from_edges(i.right(), i.y, a.right(), i.bottom());
    for r in [top, bottom, left, right] {
        if !r.is_empty() {
            out.push(r);
        }
    }
    out
}

fn merge_if_adjacent(a: IntRect, b: IntRect) -> Option<IntRect> {
    let same_rows = a.y == b.y && a.height == b.height;
    if same_rows && (a.right() == b.x || b.right() == a.x) {
        return Some(a.union(b));
    }
    let same_cols = a.x == b.x && a.width == b.width;
    if same_cols && (a.bottom() == b.y || b.bottom() == a.y) {
        return Some(a.union(b));
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/region.rs"]
mod tests;
