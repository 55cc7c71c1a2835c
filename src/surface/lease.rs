use crate::config::TileStoreConfig;
use crate::foundation::error::{TileStoreError, TileStoreResult};
use crate::surface::pool::SurfacePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one backing store sharing a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
struct LeaseState {
    active: Option<StoreId>,
    // Last store whose content the tiles hold.
    last_owner: Option<StoreId>,
    generation: u64,
}

/// What an acquisition found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// Store whose lease was revoked by this acquisition.
    pub revoked: Option<StoreId>,
    /// `true` when the tiles still hold this store's content from its previous lease.
    pub content_retained: bool,
}

/// One tile pool shared by several backing stores, of which at most one is active.
///
/// The small lease state sits behind its own mutex, separate from the pool, so "is this store
/// active" queries never wait on a render pass.
#[derive(Debug)]
pub struct SharedPool {
    state: Mutex<LeaseState>,
    pool: Mutex<SurfacePool>,
}

impl SharedPool {
    /// Wrap a pool for sharing.
    pub fn new(pool: SurfacePool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LeaseState::default()),
            pool: Mutex::new(pool),
        })
    }

    /// Build an uninitialized pool sized from `cfg`.
    pub fn from_config(cfg: &TileStoreConfig) -> Arc<Self> {
        Self::new(SurfacePool::new(cfg.tile_count, cfg.max_pool_bytes))
    }

    fn state(&self) -> MutexGuard<'_, LeaseState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand the pool to `owner`, revoking any other holder's lease.
    pub fn acquire(self: &Arc<Self>, owner: StoreId) -> (PoolLease, Acquired) {
        let mut st = self.state();
        let revoked = st.active.filter(|a| *a != owner);
        let content_retained = st.last_owner == Some(owner);
        st.generation = st.generation.wrapping_add(1);
        st.active = Some(owner);
        st.last_owner = Some(owner);
        let lease = PoolLease {
            shared: Arc::clone(self),
            owner,
            generation: st.generation,
        };
        if let Some(prev) = revoked {
            tracing::debug!(?prev, ?owner, "pool lease transferred");
        }
        (
            lease,
            Acquired {
                revoked,
                content_retained,
            },
        )
    }

    /// Current lease holder.
    pub fn active_owner(&self) -> Option<StoreId> {
        self.state().active
    }

    /// Return `true` when `owner` holds the lease.
    pub fn is_active(&self, owner: StoreId) -> bool {
        self.state().active == Some(owner)
    }

    fn lock_pool(&self) -> MutexGuard<'_, SurfacePool> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive right to use a [`SharedPool`]. Dropping the lease releases it.
#[derive(Debug)]
pub struct PoolLease {
    shared: Arc<SharedPool>,
    owner: StoreId,
    generation: u64,
}

impl PoolLease {
    /// Store holding the lease.
    pub fn owner(&self) -> StoreId {
        self.owner
    }

    /// Return `false` once another store acquired the pool.
    pub fn is_valid(&self) -> bool {
        let st = self.shared.state();
        st.active == Some(self.owner) && st.generation == self.generation
    }

    /// Lock the pool, failing with an ownership error if the lease was revoked.
    pub fn pool(&self) -> TileStoreResult<MutexGuard<'_, SurfacePool>> {
        if !self.is_valid() {
            return Err(TileStoreError::ownership(format!(
                "store {:?} no longer holds the pool lease",
                self.owner
            )));
        }
        Ok(self.shared.lock_pool())
    }
}

impl Drop for PoolLease {
    fn drop(&mut self) {
        let mut st = self.shared.state();
        if st.active == Some(self.owner) && st.generation == self.generation {
            st.active = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/lease.rs"]
mod tests;
