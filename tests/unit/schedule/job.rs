use super::*;

#[test]
fn contained_rect_is_dropped() {
    let mut l = JobList::default();
    assert!(l.add(IntRect::new(0, 0, 100, 100)));
    assert!(!l.add(IntRect::new(10, 10, 5, 5)));
    assert_eq!(l.len(), 1);
}

#[test]
fn covering_rect_replaces_smaller_ones() {
    let mut l = JobList::default();
    l.add(IntRect::new(0, 0, 10, 10));
    l.add(IntRect::new(50, 50, 10, 10));
    l.add(IntRect::new(0, 0, 100, 100));
    assert_eq!(l.rects(), &[IntRect::new(0, 0, 100, 100)]);
}

#[test]
fn adjacent_rects_merge_but_distant_ones_do_not() {
    let mut l = JobList::default();
    l.add(IntRect::new(0, 0, 10, 10));
    l.add(IntRect::new(10, 0, 10, 10));
    assert_eq!(l.rects(), &[IntRect::new(0, 0, 20, 10)]);

    l.add(IntRect::new(100, 100, 10, 10));
    assert_eq!(l.len(), 2);
}

#[test]
fn merge_cascades() {
    let mut l = JobList::default();
    l.add(IntRect::new(0, 0, 10, 10));
    l.add(IntRect::new(20, 0, 10, 10));
    // Bridges the two, so all three collapse into one strip.
    l.add(IntRect::new(10, 0, 10, 10));
    assert_eq!(l.rects(), &[IntRect::new(0, 0, 30, 10)]);
}

#[test]
fn subtract_and_split() {
    let mut l = JobList::default();
    l.add(IntRect::new(0, 0, 100, 10));
    l.subtract(IntRect::new(0, 0, 50, 10));
    assert_eq!(l.rects(), &[IntRect::new(50, 0, 50, 10)]);

    let outside = l.retain_within(IntRect::new(0, 0, 80, 10));
    assert_eq!(l.rects(), &[IntRect::new(50, 0, 30, 10)]);
    assert_eq!(outside, vec![IntRect::new(80, 0, 20, 10)]);

    let taken = l.take_within(IntRect::new(60, 0, 100, 100));
    assert_eq!(taken, vec![IntRect::new(60, 0, 20, 10)]);
    assert_eq!(l.rects(), &[IntRect::new(50, 0, 10, 10)]);
}

#[test]
fn class_order() {
    assert!(JobClass::VisibleZoom < JobClass::Regular);
    for (i, c) in JobClass::ALL.iter().enumerate() {
        assert_eq!(c.index(), i);
    }
    assert!(JobClass::VisibleScroll.is_visible());
    assert!(!JobClass::NonVisibleScroll.is_visible());
}
