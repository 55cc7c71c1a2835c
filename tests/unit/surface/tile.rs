use super::*;

fn tile() -> Tile {
    Tile::new(TileId(0), IntSize::new(8, 8)).unwrap()
}

fn front_pixel(t: &Tile, x: usize, y: usize) -> [u8; 4] {
    t.buffers().with_front(|f| {
        let w = usize::from(f.pixmap().width());
        let i = (y * w + x) * 4;
        let d = f.pixmap().data_as_u8_slice();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    })
}

fn paint_back(t: &Tile, r: IntRect, rgba: [u8; 4]) {
    t.buffers().with_back_mut(|b| {
        let w = usize::from(b.pixmap().width());
        let data = b.pixmap_mut().data_as_u8_slice_mut();
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let i = (y as usize * w + x as usize) * 4;
                data[i..i + 4].copy_from_slice(&rgba);
            }
        }
        b.add_rendered_region(r);
    });
}

#[test]
fn reset_clears_regions_shift_and_commit() {
    let mut t = tile();
    t.commit();
    t.add_rendered_region(BufferRole::Front, IntRect::new(0, 0, 8, 8));
    t.add_rendered_region(BufferRole::Back, IntRect::new(0, 0, 8, 8));
    t.uncommit_with_shift(TileShift { dx: 1, dy: -1 });

    t.reset(false);
    assert!(!t.is_committed());
    assert!(t.shift().is_zero());
    assert!(t.front_region().is_empty());
    assert!(t.back_region().is_empty());
}

#[test]
fn is_rendered_requires_commit_and_coverage() {
    let mut t = tile();
    t.add_rendered_region(BufferRole::Front, IntRect::new(0, 0, 4, 8));
    assert!(!t.is_rendered(IntRect::new(0, 0, 2, 2)));
    t.commit();
    assert!(t.is_rendered(IntRect::new(0, 0, 2, 2)));
    assert!(!t.is_rendered(IntRect::new(2, 0, 4, 2)));
}

#[test]
fn background_is_painted_once() {
    let mut t = tile();
    t.paint_background(Rgba8Premul::WHITE);
    t.swap_buffers();
    assert_eq!(front_pixel(&t, 0, 0), [255, 255, 255, 255]);

    // The new back buffer never received the fill; a second call must not touch it.
    t.paint_background(Rgba8Premul::WHITE);
    t.buffers().with_back_mut(|b| {
        assert_eq!(&b.pixmap().data_as_u8_slice()[0..4], &[0, 0, 0, 0]);
    });

    t.reset(true);
    t.paint_background(Rgba8Premul::WHITE);
    t.buffers().with_back_mut(|b| {
        assert_eq!(&b.pixmap().data_as_u8_slice()[0..4], &[255, 255, 255, 255]);
    });
}

#[test]
fn copy_forward_preserves_valid_pixels_across_partial_repaint() {
    let mut t = tile();
    t.commit();
    paint_back(&t, IntRect::new(0, 0, 8, 8), [10, 10, 10, 255]);
    t.swap_buffers();
    t.buffers().with_back_mut(|b| b.clear_all_rendered());

    let repaint = IntRect::new(0, 0, 4, 4);
    t.copy_forward(repaint);
    paint_back(&t, repaint, [99, 99, 99, 255]);
    t.swap_buffers();

    assert_eq!(t.front_region().area(), 64);
    assert_eq!(front_pixel(&t, 1, 1), [99, 99, 99, 255]);
    assert_eq!(front_pixel(&t, 6, 6), [10, 10, 10, 255]);
}

#[test]
fn copy_forward_keeps_pixels_already_painted_this_pass() {
    let mut t = tile();
    t.commit();
    paint_back(&t, IntRect::new(0, 0, 8, 8), [10, 10, 10, 255]);
    t.swap_buffers();
    t.buffers().with_back_mut(|b| b.clear_all_rendered());

    paint_back(&t, IntRect::new(4, 4, 4, 4), [50, 50, 50, 255]);
    t.copy_forward(IntRect::new(0, 0, 2, 2));
    t.swap_buffers();

    assert_eq!(front_pixel(&t, 5, 5), [50, 50, 50, 255]);
    assert_eq!(front_pixel(&t, 3, 3), [10, 10, 10, 255]);
    assert_eq!(t.front_region().area(), 64 - 4);
}
