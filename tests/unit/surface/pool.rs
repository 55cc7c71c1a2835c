use super::*;

const MIB: usize = 1024 * 1024;

#[test]
fn initialize_allocates_once() {
    let mut pool = SurfacePool::new(4, 64 * MIB);
    pool.initialize(IntSize::new(64, 64));
    assert_eq!(pool.len(), 4);
    assert!(pool.shared_back_buffer().is_some());
    assert_eq!(pool.stats().retained_bytes, 64 * 64 * 4 * 9);

    pool.initialize(IntSize::new(128, 128));
    assert_eq!(pool.tile_size(), Some(IntSize::new(64, 64)));
    assert_eq!(pool.tiles()[0].size(), IntSize::new(64, 64));
}

#[test]
fn zero_count_is_empty_but_initialized() {
    let mut pool = SurfacePool::new(0, 64 * MIB);
    pool.initialize(IntSize::new(64, 64));
    assert!(pool.is_initialized());
    assert!(pool.is_empty());
    assert!(!pool.stats().degraded);
}

#[test]
fn over_budget_degrades_to_empty() {
    let mut pool = SurfacePool::new(6, 1024);
    pool.initialize(IntSize::new(64, 64));
    assert!(pool.is_initialized());
    assert!(pool.is_empty());
    assert!(pool.shared_back_buffer().is_none());
    assert!(pool.stats().degraded);
}

#[test]
fn oversized_tiles_degrade_to_empty() {
    let mut pool = SurfacePool::new(1, usize::MAX);
    pool.initialize(IntSize::new(70_000, 1));
    assert!(pool.is_empty());
    assert!(pool.stats().degraded);
}

#[test]
fn tile_ids_match_indices() {
    let mut pool = SurfacePool::new(3, 64 * MIB);
    pool.initialize(IntSize::new(16, 16));
    for (i, t) in pool.tiles().iter().enumerate() {
        assert_eq!(t.id(), TileId(i as u32));
    }
    assert!(pool.tile(TileId(3)).is_none());
    assert!(pool.tile_and_scratch_mut(TileId(2)).is_some());
}

#[test]
fn snapshot_reallocates_only_on_size_change() {
    let mut pool = SurfacePool::new(0, 64 * MIB);
    let a = pool.ensure_visible_snapshot(IntSize::new(100, 50)).unwrap();
    let b = pool.ensure_visible_snapshot(IntSize::new(100, 50)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.is_single_buffered());

    let c = pool.ensure_visible_snapshot(IntSize::new(80, 50)).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(pool.stats().snapshot_allocs, 2);
}
