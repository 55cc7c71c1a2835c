use super::*;

fn state() -> GeometryState {
    GeometryState::new(
        IntPoint::new(512, 0),
        GridSize::new(2, 3),
        IntSize::new(512, 512),
        (0..6).map(TileId).collect(),
    )
}

#[test]
fn grid_rect_and_cells() {
    let s = state();
    assert_eq!(s.grid_rect(), IntRect::new(512, 0, 1024, 1536));
    assert_eq!(s.cell_of(3), (1, 1));
    assert_eq!(s.tile_rect(3), IntRect::new(1024, 512, 512, 512));
    assert_eq!(s.index_of(TileId(5)), Some(5));
}

#[test]
fn tiles_in_rect_covers_touched_cells_only() {
    let s = state();
    let hits = s.tiles_in_rect(IntRect::new(1000, 500, 100, 20));
    let idx: Vec<usize> = hits.iter().map(|h| h.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);

    let hits = s.tiles_in_rect(IntRect::new(0, 0, 512, 512));
    assert!(hits.is_empty());

    // A rect ending exactly on a cell edge does not touch the next cell.
    let hits = s.tiles_in_rect(IntRect::new(512, 0, 512, 512));
    assert_eq!(hits.len(), 1);
}

#[test]
fn publish_swaps_front() {
    let mut pair = GeometryPair::default();
    pair.publish(state());
    assert_eq!(pair.front().grid(), GridSize::new(2, 3));

    let mut tiles: Vec<TileId> = (0..6).map(TileId).collect();
    tiles.reverse();
    pair.publish(GeometryState::new(
        IntPoint::new(0, 512),
        GridSize::new(2, 3),
        IntSize::new(512, 512),
        tiles,
    ));
    assert_eq!(pair.front().origin(), IntPoint::new(0, 512));
    assert_eq!(pair.front().tiles()[0], TileId(5));
}
