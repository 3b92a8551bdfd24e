use crate::types::{OutboundCall, OutboundResult, Result};
use async_trait::async_trait;

/// Something that can carry an outbound call to the payment provider.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn call(&self, call: OutboundCall) -> Result<OutboundResult>;
}
