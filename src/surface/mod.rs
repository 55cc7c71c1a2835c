//! Tile pixel storage: double buffers, tiles, the shared pool and its lease.

/// Pixel buffers and the double buffer.
pub mod buffer;
/// Pool sharing between stores.
pub mod lease;
/// The fixed tile pool.
pub mod pool;
/// Tiles and their content shift.
pub mod tile;

pub use buffer::{BufferRole, DoubleBuffer, TileBuffer};
pub use lease::{Acquired, PoolLease, SharedPool, StoreId};
pub use pool::{SurfacePool, SurfacePoolStats};
pub use tile::{Tile, TileId, TileShift};
