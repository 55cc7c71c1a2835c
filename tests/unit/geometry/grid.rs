use super::*;

fn placement(visible: IntRect, delta: IntPoint) -> GridPlacement {
    GridPlacement {
        visible,
        content: IntSize::new(2000, 3000),
        tile: IntSize::new(512, 512),
        grid_size: IntSize::new(1024, 1536),
        delta,
    }
}

#[test]
fn initial_placement_starts_at_visible_tile() {
    let g = compute_grid_rect(None, &placement(IntRect::new(0, 0, 1024, 768), IntPoint::ZERO));
    assert_eq!(g, IntRect::new(0, 0, 1024, 1536));
}

#[test]
fn scrolling_down_600_moves_one_row() {
    let prev = IntRect::new(0, 0, 1024, 1536);
    let g = compute_grid_rect(
        Some(prev),
        &placement(IntRect::new(0, 600, 1024, 768), IntPoint::new(0, 600)),
    );
    assert_eq!(g, IntRect::new(0, 512, 1024, 1536));
}

#[test]
fn small_scroll_keeps_grid() {
    let prev = IntRect::new(0, 0, 1024, 1536);
    let g = compute_grid_rect(
        Some(prev),
        &placement(IntRect::new(0, 100, 1024, 768), IntPoint::new(0, 100)),
    );
    assert_eq!(g, prev);
}

#[test]
fn scrolling_up_moves_back() {
    let prev = IntRect::new(0, 512, 1024, 1536);
    let g = compute_grid_rect(
        Some(prev),
        &placement(IntRect::new(0, 300, 1024, 768), IntPoint::new(0, -300)),
    );
    assert_eq!(g, IntRect::new(0, 0, 1024, 1536));
}

#[test]
fn far_jump_snaps_to_visible_tile() {
    let prev = IntRect::new(0, 0, 1024, 1536);
    let g = compute_grid_rect(
        Some(prev),
        &placement(IntRect::new(0, 2000, 1024, 768), IntPoint::new(0, 2000)),
    );
    assert_eq!(g, IntRect::new(0, 1536, 1024, 1536));
}

#[test]
fn grid_does_not_hang_a_whole_row_past_content() {
    let g = compute_grid_rect(
        None,
        &placement(IntRect::new(0, 2232, 1024, 768), IntPoint::ZERO),
    );
    assert_eq!(g, IntRect::new(0, 1536, 1024, 1536));
}

#[test]
fn grid_always_covers_the_viewport_while_scrolling() {
    let mut prev: Option<IntRect> = None;
    let mut y = 0;
    for dy in [120, 400, 700, 33, 900, -600, -250, 512, -1024] {
        y = (y + dy).clamp(0, 3000 - 768);
        let visible = IntRect::new(0, y, 1024, 768);
        let g = compute_grid_rect(prev, &placement(visible, IntPoint::new(0, dy)));
        assert!(g.contains_rect(visible), "grid {g:?} misses {visible:?}");
        assert_eq!(g.y % 512, 0);
        prev = Some(g);
    }
}

#[test]
fn align_down_handles_negatives() {
    let t = IntSize::new(512, 256);
    assert_eq!(align_down(IntPoint::new(700, 300), t), IntPoint::new(512, 256));
    assert_eq!(align_down(IntPoint::new(-1, -1), t), IntPoint::new(-512, -256));
}
