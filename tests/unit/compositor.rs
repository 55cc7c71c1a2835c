use super::*;
use crate::surface::buffer::BufferRole;

fn solid(size: i32, rgba: [u8; 4], rendered: IntRect) -> Arc<DoubleBuffer> {
    let b = Arc::new(DoubleBuffer::new(IntSize::new(size, size)).unwrap());
    b.with_buffer_mut(BufferRole::Front, |f| {
        for px in f.pixmap_mut().data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        f.add_rendered_region(rendered);
    });
    b
}

fn tile(id: u32, buffers: Arc<DoubleBuffer>, x: i32, y: i32, committed: bool) -> CompositeTile {
    CompositeTile {
        id: TileId(id),
        buffers,
        content_origin: IntPoint::new(x, y),
        committed,
    }
}

#[test]
fn rendered_pixels_are_drawn_and_the_rest_is_checkerboard() {
    let (mut c, reader) = CpuCompositor::new();
    let red = solid(16, [255, 0, 0, 255], IntRect::new(0, 0, 8, 16));
    let frame = CompositeFrame {
        viewport: IntRect::new(0, 0, 32, 16),
        tiles: vec![tile(0, red, 0, 0, true)],
    };
    c.composite(&frame).unwrap();

    let out = reader.latest().unwrap();
    assert_eq!((out.width, out.height), (32, 16));
    assert_eq!(out.pixel(3, 3), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(12, 3), Some(CHECKER_DARK));
    assert_eq!(out.pixel(20, 3), Some(CHECKER_LIGHT));
    assert_eq!(reader.frames_presented(), 1);
}

#[test]
fn viewport_offset_maps_content_to_display() {
    let (mut c, reader) = CpuCompositor::new();
    let blue = solid(16, [0, 0, 255, 255], IntRect::new(0, 0, 16, 16));
    let frame = CompositeFrame {
        viewport: IntRect::new(10, 10, 8, 8),
        tiles: vec![tile(0, blue, 16, 16, true)],
    };
    c.composite(&frame).unwrap();
    let out = reader.latest().unwrap();
    assert_eq!(out.pixel(5, 5), Some(CHECKER_LIGHT));
    assert_eq!(out.pixel(6, 6), Some([0, 0, 255, 255]));
}

#[test]
fn committed_tiles_draw_over_uncommitted() {
    let (mut c, reader) = CpuCompositor::new();
    let old = solid(16, [1, 1, 1, 255], IntRect::new(0, 0, 16, 16));
    let new = solid(16, [2, 2, 2, 255], IntRect::new(0, 0, 16, 16));
    let frame = CompositeFrame {
        viewport: IntRect::new(0, 0, 16, 16),
        tiles: vec![tile(0, new, 0, 0, true), tile(1, old, 0, 0, false)],
    };
    c.composite(&frame).unwrap();
    assert_eq!(reader.latest().unwrap().pixel(0, 0), Some([2, 2, 2, 255]));
}

#[test]
fn direct_snapshot_and_destroy() {
    let (mut c, reader) = CpuCompositor::new();
    let snap = DoubleBuffer::new_single(IntSize::new(4, 4)).unwrap();
    snap.with_back_mut(|b| {
        b.fill(crate::foundation::core::Rgba8Premul::WHITE);
        b.add_rendered_region(IntRect::new(0, 0, 4, 4));
    });
    c.present_direct(IntRect::new(100, 100, 4, 4), &snap).unwrap();
    assert_eq!(reader.latest().unwrap().pixel(3, 3), Some([255, 255, 255, 255]));

    c.destroy_resources();
    assert!(reader.latest().is_none());
}
