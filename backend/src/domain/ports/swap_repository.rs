//! Port for shift swap requests and the shift locks they hold.

use async_trait::async_trait;

use crate::domain::{OrganizationId, ShiftSwap, SwapExchange, SwapId, SwapStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by swap repository adapters.
    pub enum SwapRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "swap repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "swap repository query failed: {message}",
        /// One of the shifts already belongs to an open swap.
        ShiftLocked { message: String } =>
            "shift is already part of an open swap: {message}",
        /// A compare-and-set guard found different data than expected.
        Stale { message: String } =>
            "swap state changed concurrently: {message}",
    }
}

/// Store for swap requests.
///
/// A non-terminal swap holds one lock row per shift it references. Locks are
/// taken on insert and released when the swap reaches a terminal status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapRepository: Send + Sync {
    /// Insert a new request and lock both shifts in one transaction.
    ///
    /// Fails with [`SwapRepositoryError::ShiftLocked`] when either shift is
    /// already locked.
    async fn insert(&self, swap: &ShiftSwap) -> Result<(), SwapRepositoryError>;

    /// Find a swap by id within the organization.
    async fn find(
        &self,
        organization_id: OrganizationId,
        swap_id: SwapId,
    ) -> Result<Option<ShiftSwap>, SwapRepositoryError>;

    /// Store `swap` if the stored status still equals `expected`, releasing
    /// the shift locks when the new status is terminal.
    async fn transition(
        &self,
        swap: &ShiftSwap,
        expected: SwapStatus,
    ) -> Result<(), SwapRepositoryError>;

    /// Approve a swap and exchange shift owners in one transaction.
    ///
    /// Every row is guarded by its expected prior value; any mismatch rolls
    /// the whole exchange back with [`SwapRepositoryError::Stale`].
    async fn commit_exchange(&self, exchange: &SwapExchange) -> Result<(), SwapRepositoryError>;
}
