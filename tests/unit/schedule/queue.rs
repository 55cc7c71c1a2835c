use super::*;
use crate::config::PressurePolicy;
use std::time::Duration;

fn scheduler(batch: usize, min_arrivals: usize) -> RenderScheduler {
    let cfg = TileStoreConfig {
        pressure: PressurePolicy {
            enabled: true,
            min_arrivals,
            regular_batch_size: batch,
        },
        ..TileStoreConfig::default()
    };
    let mut s = RenderScheduler::new(&cfg);
    s.set_content_size(IntSize::new(1000, 1000));
    s
}

fn row(i: i32) -> IntRect {
    // Rows far enough apart that they never coalesce.
    IntRect::new(0, i * 20, 10, 10)
}

#[test]
fn jobs_are_clamped_to_content() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::Regular, IntRect::new(900, 900, 500, 500));
    s.add_job(JobClass::Regular, IntRect::new(2000, 0, 10, 10));
    assert_eq!(s.pending(JobClass::Regular), &[IntRect::new(900, 900, 100, 100)]);
}

#[test]
fn visible_classes_run_before_regular() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::Regular, row(0));
    s.add_job(JobClass::NonVisibleScroll, row(1));
    s.add_job(JobClass::VisibleScroll, row(2));
    s.add_job(JobClass::VisibleZoom, row(3));

    let mut order = Vec::new();
    let report = s.render(true, Instant::now(), |job| {
        order.push(job.class);
        Region::new()
    });
    assert_eq!(
        order,
        vec![
            JobClass::VisibleZoom,
            JobClass::VisibleScroll,
            JobClass::NonVisibleScroll,
            JobClass::Regular
        ]
    );
    assert_eq!(report.total(), 4);
    assert!(!s.has_pending());
}

#[test]
fn regular_waits_when_not_allowed() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::Regular, row(0));
    s.add_job(JobClass::VisibleScroll, row(1));
    let report = s.render(false, Instant::now(), |_| Region::new());
    assert_eq!(report.painted(JobClass::VisibleScroll), 1);
    assert_eq!(report.painted(JobClass::Regular), 0);
    assert_eq!(s.pending(JobClass::Regular).len(), 1);
    assert!(!s.has_pending_visible_job());
}

#[test]
fn failed_paint_leftover_is_requeued() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::VisibleScroll, IntRect::new(0, 0, 100, 100));
    let report = s.render(true, Instant::now(), |job| {
        let mut r = Region::from_rect(job.rect);
        r.subtract_rect(IntRect::new(0, 0, 100, 50));
        r
    });
    assert_eq!(report.requeued, 1);
    assert_eq!(s.pending(JobClass::VisibleScroll), &[IntRect::new(0, 50, 100, 50)]);
}

#[test]
fn regular_batch_is_bounded_until_pressure() {
    let t0 = Instant::now();
    let mut s = scheduler(2, 8);
    for i in 0..10 {
        s.add_job(JobClass::Regular, row(i));
    }

    let r1 = s.render(true, t0, |_| Region::new());
    assert_eq!(r1.painted(JobClass::Regular), 2);
    assert!(!r1.pressure_drain);

    // The window closes with 10 arrivals against 2 drained.
    let r2 = s.render(true, t0 + Duration::from_millis(20), |_| Region::new());
    assert!(r2.pressure_drain);
    assert_eq!(r2.painted(JobClass::Regular), 8);
    assert!(!s.is_under_pressure());
    assert_eq!(s.stats().pressure_drains, 1);
}

#[test]
fn only_queued_regular_arrivals_build_pressure() {
    let t0 = Instant::now();
    let mut s = scheduler(2, 4);
    s.tick(t0);
    for i in 0..10 {
        s.add_job(JobClass::Regular, IntRect::new(2000, i * 20, 10, 10));
        s.requeue_job(JobClass::Regular, row(i));
    }
    assert_eq!(s.pending(JobClass::Regular).len(), 10);

    s.tick(t0 + Duration::from_millis(20));
    assert!(!s.is_under_pressure());

    for i in 0..4 {
        s.add_job(JobClass::Regular, row(20 + i));
    }
    s.tick(t0 + Duration::from_millis(40));
    assert!(s.is_under_pressure());
}

#[test]
fn leftover_work_rearms_the_fallback() {
    let t0 = Instant::now();
    let mut s = scheduler(2, 8);
    for i in 0..5 {
        s.add_job(JobClass::Regular, row(i));
    }
    s.render(true, t0, |_| Region::new());
    assert!(s.has_pending());
    assert!(s.poll_fallback(t0 + Duration::from_millis(100)));

    s.render(true, t0 + Duration::from_millis(100), |_| Region::new());
    s.render(true, t0 + Duration::from_millis(110), |_| Region::new());
    assert!(!s.has_pending());
    assert!(!s.poll_fallback(t0 + Duration::from_secs(10)));
}

#[test]
fn clear_spares_regular_unless_asked() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::Regular, IntRect::new(0, 0, 100, 100));
    s.add_job(JobClass::VisibleScroll, IntRect::new(0, 0, 100, 100));
    s.clear(IntRect::new(0, 0, 100, 100), false);
    assert!(!s.has_pending_visible_job());
    assert_eq!(s.pending(JobClass::Regular).len(), 1);
    s.clear(IntRect::new(0, 0, 100, 100), true);
    assert!(!s.has_pending());
}

#[test]
fn clipping_records_attempted_regular_work() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::Regular, IntRect::new(0, 400, 100, 200));
    s.clip_to_grid(IntRect::new(0, 0, 1000, 500));

    assert_eq!(s.pending(JobClass::Regular), &[IntRect::new(0, 400, 100, 100)]);
    assert!(s.previously_attempted_but_not_rendered(IntRect::new(50, 550, 10, 10)));
    assert!(!s.previously_attempted_but_not_rendered(IntRect::new(50, 450, 10, 10)));
    assert_eq!(s.attempted_in(IntRect::new(0, 500, 50, 50)).area(), 2500);

    s.forget_attempted(IntRect::new(0, 500, 1000, 500));
    assert!(!s.previously_attempted_but_not_rendered(IntRect::new(50, 550, 10, 10)));
}

#[test]
fn promotion_moves_visible_parts_only() {
    let mut s = scheduler(16, 8);
    s.add_job(JobClass::NonVisibleScroll, IntRect::new(0, 0, 100, 200));
    s.promote_visible(IntRect::new(0, 0, 100, 50));
    assert_eq!(s.pending(JobClass::VisibleScroll), &[IntRect::new(0, 0, 100, 50)]);
    assert_eq!(s.pending(JobClass::NonVisibleScroll), &[IntRect::new(0, 50, 100, 150)]);
}

#[test]
fn fallback_fires_once_while_work_waits() {
    let t0 = Instant::now();
    let mut s = scheduler(16, 8);
    s.arm_fallback(t0);
    assert!(!s.poll_fallback(t0 + Duration::from_secs(1)), "nothing queued");

    s.add_job(JobClass::Regular, row(0));
    s.arm_fallback(t0);
    assert!(!s.poll_fallback(t0 + Duration::from_millis(10)));
    assert!(s.poll_fallback(t0 + Duration::from_millis(100)));
    assert!(!s.poll_fallback(t0 + Duration::from_millis(300)));
    assert_eq!(s.stats().fallback_fires, 1);
}
