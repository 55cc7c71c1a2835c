//! tilestore is a tiled backing store for scrolling and zooming large rendered content.
//!
//! A fixed pool of double-buffered tiles covers the visible part of the content plus some slack.
//! Render jobs are queued by priority and painted into back buffers on the content context;
//! finished tiles are flipped in one batch and composited on a separate display context.
//!
//! - Build a [`TileStoreConfig`] and a [`SharedPool`] from it
//! - Start a [`DisplayContext`] around a [`Compositor`] (or use [`DisplayHandle::inline`])
//! - Create a [`BackingStore`] per page with a [`ContentRenderer`], then acquire its lease
//! - Drive it with scroll, resize, zoom and invalidation calls plus [`BackingStore::tick`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod foundation;

/// Display-side compositing of tile front buffers.
pub mod compositor;
/// Tile store configuration.
pub mod config;
/// Content producers painted into tiles.
pub mod content;
/// Cross-thread task dispatch to the display context.
pub mod dispatch;
pub mod geometry;
pub mod schedule;
/// The backing store tying geometry, scheduling and buffers together.
pub mod store;
pub mod surface;
/// Batched front/back buffer flips.
pub mod swap;

pub use crate::compositor::{
    CompositeFrame, CompositeTile, Compositor, CpuCompositor, DisplayFrame, FrameReader,
};
pub use crate::config::{PressurePolicy, TileStoreConfig};
pub use crate::content::{ContentRenderer, CoordinateContent, CoordinateProbe, StripedDocument};
pub use crate::dispatch::{DisplayContext, DisplayHandle};
pub use crate::foundation::core::{IntPoint, IntRect, IntSize, Rgba8Premul};
pub use crate::foundation::error::{TileStoreError, TileStoreResult};
pub use crate::foundation::region::Region;
pub use crate::geometry::{Axis, GeometryState, GridSize};
pub use crate::schedule::{JobClass, PassReport, RenderScheduler, SchedulerStats};
pub use crate::store::{BackingStore, BackingStoreStats, TileState};
pub use crate::surface::{SharedPool, StoreId, SurfacePool, SurfacePoolStats, TileId, TileShift};
pub use crate::swap::SwapCoordinator;
