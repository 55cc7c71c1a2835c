use crate::foundation::core::{IntPoint, IntRect, IntSize};

// A grid move is one tile per step; no sane content needs more steps than this per axis.
const MAX_STEPS: usize = 4096;

/// Inputs to one grid placement.
#[derive(Clone, Copy, Debug)]
pub struct GridPlacement {
    /// Content-space rectangle currently shown.
    pub visible: IntRect,
    /// Scrollable content size.
    pub content: IntSize,
    /// Tile dimensions.
    pub tile: IntSize,
    /// Grid extent in pixels (shape times tile size).
    pub grid_size: IntSize,
    /// Last scroll delta; zero for resize and zoom.
    pub delta: IntPoint,
}

/// Round `p` down to the enclosing multiple of `tile` on both axes.
pub fn align_down(p: IntPoint, tile: IntSize) -> IntPoint {
    IntPoint::new(
        p.x.div_euclid(tile.width.max(1)) * tile.width.max(1),
        p.y.div_euclid(tile.height.max(1)) * tile.height.max(1),
    )
}

/// Place the grid for `inputs`, starting from `previous` (the old grid rect, if any).
///
/// The grid keeps the previous origin when it still overlaps the visible rect and then slides
/// one tile at a time while a move is both wanted (an edge lags the visible rect extended one
/// tile in the scroll direction) and allowed (the viewport stays covered and the grid does not
/// run past the content). Each axis moves in at most one direction per call. Otherwise the
/// grid snaps to the tile containing the visible origin.
pub fn compute_grid_rect(previous: Option<IntRect>, inputs: &GridPlacement) -> IntRect {
    let content = IntRect::from_size(inputs.content);
    let visible = inputs.visible.intersect(content);
    let tile = inputs.tile;

    let start = previous
        .map(|p| IntRect::from_origin_size(p.origin(), inputs.grid_size))
        .filter(|g| g.intersects(visible))
        .map(|g| g.origin())
        .unwrap_or_else(|| align_down(visible.origin(), tile));

    let grid = IntRect::from_origin_size(start, inputs.grid_size);
    if visible.is_empty() || tile.is_empty() {
        return grid;
    }

    let expanded = expand_in_scroll_direction(visible, inputs.delta, tile).intersect(content);

    let y = slide_axis(
        Span::new(grid.y, grid.bottom()),
        Span::new(visible.y, visible.bottom()),
        Span::new(expanded.y, expanded.bottom()),
        Span::new(content.y, content.bottom()),
        tile.height,
    );
    let x = slide_axis(
        Span::new(grid.x, grid.right()),
        Span::new(visible.x, visible.right()),
        Span::new(expanded.x, expanded.right()),
        Span::new(content.x, content.right()),
        tile.width,
    );
    grid.translate(x, y)
}

fn expand_in_scroll_direction(visible: IntRect, delta: IntPoint, tile: IntSize) -> IntRect {
    let mut left = visible.x;
    let mut right = visible.right();
    let mut top = visible.y;
    let mut bottom = visible.bottom();
    match delta.x.signum() {
        1 => right += tile.width,
        -1 => left -= tile.width,
        _ => {}
    }
    match delta.y.signum() {
        1 => bottom += tile.height,
        -1 => top -= tile.height,
        _ => {}
    }
    IntRect::from_edges(left, top, right, bottom)
}

#[derive(Clone, Copy, Debug)]
struct Span {
    lo: i32,
    hi: i32,
}

impl Span {
    fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Dir {
    Forward,
    Backward,
}

// One axis of the grid move. "Forward" is right/down.
fn slide_axis(grid: Span, visible: Span, expanded: Span, content: Span, step: i32) -> i32 {
    let mut g = grid;
    let mut dir: Option<Dir> = None;
    for _ in 0..MAX_STEPS {
        let should_forward = g.hi < expanded.hi;
        let can_forward = g.lo + step <= visible.lo && g.hi < content.hi;
        let should_backward = g.lo > expanded.lo || g.hi - step >= content.hi;
        let can_backward = g.hi - step >= visible.hi && g.lo > content.lo;

        if dir != Some(Dir::Backward) && should_forward && can_forward {
            dir = Some(Dir::Forward);
            g = Span::new(g.lo + step, g.hi + step);
        } else if dir != Some(Dir::Forward) && should_backward && can_backward {
            dir = Some(Dir::Backward);
            g = Span::new(g.lo - step, g.hi - step);
        } else {
            return g.lo - grid.lo;
        }
    }
    tracing::warn!("grid placement hit the step limit");
    g.lo - grid.lo
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/grid.rs"]
mod tests;
