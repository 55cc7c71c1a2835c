use super::*;

const MS: Duration = Duration::from_millis(1);

#[test]
fn fallback_fires_once_per_arming() {
    let t0 = Instant::now();
    let mut t = FallbackTimer::new(100 * MS);
    assert!(!t.poll(t0 + 1000 * MS));

    t.arm(t0);
    assert!(t.is_armed());
    assert!(!t.poll(t0 + 50 * MS));
    assert!(t.poll(t0 + 100 * MS));
    assert!(!t.poll(t0 + 500 * MS));

    // Re-arming before a pass disarms it is ignored.
    t.arm(t0 + 600 * MS);
    assert!(!t.poll(t0 + 2000 * MS));

    t.disarm();
    t.arm(t0 + 2000 * MS);
    assert!(t.poll(t0 + 2100 * MS));
}

#[test]
fn arming_twice_keeps_first_deadline() {
    let t0 = Instant::now();
    let mut t = FallbackTimer::new(100 * MS);
    t.arm(t0);
    t.arm(t0 + 90 * MS);
    assert!(t.poll(t0 + 100 * MS));
}

fn policy(min_arrivals: usize) -> PressurePolicy {
    PressurePolicy {
        enabled: true,
        min_arrivals,
        regular_batch_size: 2,
    }
}

#[test]
fn pressure_needs_enough_arrivals_outpacing_drain() {
    let t0 = Instant::now();
    let mut p = PressureTracker::new(policy(4), 16 * MS);
    p.roll(t0);
    for _ in 0..5 {
        p.record_arrival();
    }
    p.record_drained(2);
    p.roll(t0 + 10 * MS);
    assert!(!p.is_under_pressure(), "window not over yet");
    p.roll(t0 + 16 * MS);
    assert!(p.is_under_pressure());

    p.relieve();
    p.record_arrival();
    p.roll(t0 + 40 * MS);
    assert!(!p.is_under_pressure());
}

#[test]
fn drain_keeping_up_avoids_pressure() {
    let t0 = Instant::now();
    let mut p = PressureTracker::new(policy(4), 16 * MS);
    p.roll(t0);
    for _ in 0..6 {
        p.record_arrival();
    }
    p.record_drained(6);
    p.roll(t0 + 20 * MS);
    assert!(!p.is_under_pressure());
}

#[test]
fn disabled_policy_never_triggers() {
    let t0 = Instant::now();
    let mut p = PressureTracker::new(
        PressurePolicy {
            enabled: false,
            ..policy(1)
        },
        16 * MS,
    );
    p.roll(t0);
    for _ in 0..100 {
        p.record_arrival();
    }
    p.roll(t0 + 20 * MS);
    assert!(!p.is_under_pressure());
}
