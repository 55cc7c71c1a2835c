use crate::foundation::core::IntSize;
use crate::geometry::state::GridSize;

/// Axis of the most recent scroll; breaks grid-shape ties towards that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum Axis {
    /// Horizontal scrolling favours wider grids.
    Horizontal,
    /// Vertical scrolling favours taller grids.
    #[default]
    Vertical,
}

/// Minimum tiles needed to cover `extent` pixels, never less than one.
pub fn tiles_to_cover(extent: i32, tile: i32) -> u32 {
    if tile <= 0 || extent <= 0 {
        return 1;
    }
    (extent as u64).div_ceil(tile as u64).max(1) as u32
}

/// Pick the factor pair `(wide, high)` of `count` that best matches the content's aspect ratio.
///
/// Only pairs meeting `min_wide`/`min_high` are considered. A pair whose grid overshoots the
/// content by less than one tile on either axis ("perfect fit") beats any ratio-based match.
/// Remaining ties go to the pair that is larger along `preferred`.
pub fn best_divisor(
    content: IntSize,
    tile: IntSize,
    count: usize,
    min_wide: u32,
    min_high: u32,
    preferred: Axis,
) -> Option<GridSize> {
    if count == 0 || tile.is_empty() {
        return None;
    }
    let count = u32::try_from(count).ok()?;
    let content_ratio = if content.is_empty() {
        1.0
    } else {
        f64::from(content.width) / f64::from(content.height)
    };

    let mut best: Option<(GridSize, bool, f64)> = None;
    for wide in 1..=count {
        if count % wide != 0 {
            continue;
        }
        let high = count / wide;
        if wide < min_wide || high < min_high {
            continue;
        }
        let g = GridSize::new(wide, high);
        let px = g.pixel_size(tile);
        let perfect = overshoots_by_less_than_a_tile(px.width, content.width, tile.width)
            || overshoots_by_less_than_a_tile(px.height, content.height, tile.height);
        let ratio = f64::from(px.width) / f64::from(px.height);
        let score = (ratio.ln() - content_ratio.ln()).abs();

        let better = match best {
            None => true,
            Some((bg, bperfect, bscore)) => {
                if perfect != bperfect {
                    perfect
                } else if (score - bscore).abs() > 1e-9 {
                    score < bscore
                } else {
                    match preferred {
                        Axis::Vertical => g.high > bg.high,
                        Axis::Horizontal => g.wide > bg.wide,
                    }
                }
            }
        };
        if better {
            best = Some((g, perfect, score));
        }
    }
    best.map(|(g, _, _)| g)
}

fn overshoots_by_less_than_a_tile(grid_px: i32, content_px: i32, tile_px: i32) -> bool {
    content_px > 0 && grid_px >= content_px && grid_px - content_px < tile_px
}

/// Choose the grid shape for a pool of `count` tiles.
///
/// Requirements are relaxed step by step until a factor pair fits: viewport coverage plus `margin`
/// on both axes, then the margin only along `preferred`, then bare viewport coverage, then any
/// pair. Returns `None` only for an empty pool.
pub fn grid_shape_for(
    content: IntSize,
    viewport: IntSize,
    tile: IntSize,
    count: usize,
    margin: u32,
    preferred: Axis,
) -> Option<GridSize> {
    let base_w = tiles_to_cover(viewport.width, tile.width);
    let base_h = tiles_to_cover(viewport.height, tile.height);
    let (pref_w, pref_h) = match preferred {
        Axis::Horizontal => (base_w + margin, base_h),
        Axis::Vertical => (base_w, base_h + margin),
    };

    let attempts = [
        (base_w + margin, base_h + margin),
        (pref_w, pref_h),
        (base_w, base_h),
        (1, 1),
    ];
    for (i, (w, h)) in attempts.into_iter().enumerate() {
        if let Some(g) = best_divisor(content, tile, count, w, h, preferred) {
            if i > 0 {
                tracing::debug!(
                    wide = g.wide,
                    high = g.high,
                    relaxation = i,
                    "tile pool too small for full viewport margin"
                );
            }
            return Some(g);
        }
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/divisor.rs"]
mod tests;
