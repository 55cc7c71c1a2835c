use super::*;

fn shared() -> Arc<SharedPool> {
    SharedPool::new(SurfacePool::new(2, 1 << 20))
}

#[test]
fn acquire_and_drop_releases() {
    let shared = shared();
    let a = StoreId::next();
    let (lease, acq) = shared.acquire(a);
    assert!(lease.is_valid());
    assert!(shared.is_active(a));
    assert_eq!(acq.revoked, None);
    assert!(!acq.content_retained);

    drop(lease);
    assert_eq!(shared.active_owner(), None);
}

#[test]
fn second_acquirer_revokes_first() {
    let shared = shared();
    let a = StoreId::next();
    let b = StoreId::next();
    let (la, _) = shared.acquire(a);
    let (lb, acq) = shared.acquire(b);

    assert_eq!(acq.revoked, Some(a));
    assert!(!la.is_valid());
    assert!(lb.is_valid());
    match la.pool() {
        Err(TileStoreError::Ownership(_)) => {}
        other => panic!("expected ownership error, got {other:?}"),
    }
    assert!(lb.pool().is_ok());

    // Dropping the revoked lease must not release the new holder.
    drop(la);
    assert!(shared.is_active(b));
}

#[test]
fn reacquire_reports_retained_content() {
    let shared = shared();
    let a = StoreId::next();
    let b = StoreId::next();

    let (la, _) = shared.acquire(a);
    drop(la);
    let (la, acq) = shared.acquire(a);
    assert!(acq.content_retained);
    drop(la);

    let (lb, _) = shared.acquire(b);
    drop(lb);
    let (_la, acq) = shared.acquire(a);
    assert!(!acq.content_retained);
}
