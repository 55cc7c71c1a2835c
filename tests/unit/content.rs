use super::*;

fn pixel(p: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let w = usize::from(p.width());
    let d = p.data_as_u8_slice();
    let i = (y * w + x) * 4;
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

#[test]
fn coordinate_content_paints_only_the_rect() {
    let (mut c, probe) = CoordinateContent::new(IntSize::new(1000, 1000));
    let mut px = vello_cpu::Pixmap::new(16, 16);
    c.paint(
        &mut px,
        IntPoint::new(300, 500),
        IntRect::new(304, 504, 4, 4),
        1.0,
    )
    .unwrap();
    assert_eq!(pixel(&px, 5, 5), CoordinateContent::expected(305, 505, 0));
    assert_eq!(pixel(&px, 0, 0), [0, 0, 0, 0]);
    assert_eq!(probe.paints(), 1);
    assert_eq!(probe.painted_rects(), vec![IntRect::new(304, 504, 4, 4)]);

    probe.set_generation(3);
    c.paint(&mut px, IntPoint::new(300, 500), IntRect::new(304, 504, 4, 4), 1.0)
        .unwrap();
    assert_ne!(pixel(&px, 5, 5), CoordinateContent::expected(305, 505, 0));
}

#[test]
fn striped_document_paints_band_colors() {
    let red = Rgba8Premul::from_straight_rgba(255, 0, 0, 255);
    let blue = Rgba8Premul::from_straight_rgba(0, 0, 255, 255);
    let mut doc = StripedDocument::new(IntSize::new(64, 64), 8, vec![red, blue]).unwrap();
    assert_eq!(doc.color_at(9), blue);

    let mut px = vello_cpu::Pixmap::new(16, 16);
    doc.paint(&mut px, IntPoint::new(0, 0), IntRect::new(0, 0, 16, 16), 1.0)
        .unwrap();
    assert_eq!(pixel(&px, 4, 3), red.to_array());
    assert_eq!(pixel(&px, 4, 12), blue.to_array());

    // At scale 2 each band is 16 pixels tall.
    doc.paint(&mut px, IntPoint::new(0, 0), IntRect::new(0, 0, 16, 16), 2.0)
        .unwrap();
    assert_eq!(pixel(&px, 4, 12), red.to_array());
}

#[test]
fn striped_document_rejects_bad_input() {
    assert!(StripedDocument::new(IntSize::new(1, 1), 0, vec![Rgba8Premul::WHITE]).is_err());
    assert!(StripedDocument::new(IntSize::new(1, 1), 4, Vec::new()).is_err());
    let mut doc = StripedDocument::new(IntSize::new(1, 1), 4, vec![Rgba8Premul::WHITE]).unwrap();
    let mut px = vello_cpu::Pixmap::new(1, 1);
    let err = doc.paint(&mut px, IntPoint::ZERO, IntRect::new(0, 0, 1, 1), 0.0);
    assert!(matches!(err, Err(TileStoreError::Render(_))));
}
