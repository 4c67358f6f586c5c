use std::time::Duration;

use async_trait::async_trait;

use super::errors::LeaseError;

/// Handle to one delivered broker message. The broker redelivers the
/// message unless its processing deadline keeps getting extended, and it
/// is settled exactly once with `ack` or `nack`.
#[async_trait]
pub trait BrokerLease: Send + Sync {
    /// Stable identity of the delivery; redelivered duplicates reuse it.
    fn id(&self) -> &str;

    /// Pushes the processing deadline `by` further out.
    async fn extend(&self, by: Duration) -> Result<(), LeaseError>;

    /// Confirms the message; the broker must not redeliver it.
    async fn ack(&self) -> Result<(), LeaseError>;

    /// Returns the message for redelivery.
    async fn nack(&self) -> Result<(), LeaseError>;
}
