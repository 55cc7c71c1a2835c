/// Crate-wide result alias.
pub type TileStoreResult<T> = Result<T, TileStoreError>;

/// Errors raised inside the tile store.
///
/// Only configuration and construction paths hand these back to callers. Everything reachable
/// from a render pass, scroll, or blit is logged and degraded instead.
#[derive(thiserror::Error, Debug)]
pub enum TileStoreError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Pixel buffer allocation failed or exceeded the configured budget.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// The store was used while another store held the pool lease.
    #[error("ownership error: {0}")]
    Ownership(String),

    /// A task could not be delivered to (or acknowledged by) the display context.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// The content renderer failed to paint.
    #[error("render error: {0}")]
    Render(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TileStoreError {
    /// Build a [`TileStoreError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TileStoreError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`TileStoreError::Ownership`].
    pub fn ownership(msg: impl Into<String>) -> Self {
        Self::Ownership(msg.into())
    }

    /// Build a [`TileStoreError::Dispatch`].
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Build a [`TileStoreError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
