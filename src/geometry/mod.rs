//! Tile-grid geometry: shape selection, placement over content, and tile reassignment.

/// Grid shape selection from the tile count.
pub mod divisor;
/// Grid placement over the content.
pub mod grid;
/// Tile reassignment when the grid moves.
pub mod reassign;
/// Front/back geometry snapshots.
pub mod state;

pub use divisor::{Axis, best_divisor, grid_shape_for};
pub use grid::{GridPlacement, align_down, compute_grid_rect};
pub use reassign::{ReassignOutcome, reassign_tiles};
pub use state::{GeometryPair, GeometryState, GridSize};
