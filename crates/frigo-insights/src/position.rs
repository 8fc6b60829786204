//! Current position, best effort.
//!
//! A provider that cannot answer returns `None`. Callers never substitute a
//! made-up coordinate for a missing fix.

use async_trait::async_trait;
use frigo_core::Coordinates;

#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> Option<Coordinates>;
}

/// Device without a location source.
pub struct NoPosition;

#[async_trait]
impl PositionProvider for NoPosition {
    async fn current_position(&self) -> Option<Coordinates> {
        None
    }
}

/// A position set by the operator (or a test).
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> Option<Coordinates> {
        Some(self.0)
    }
}
