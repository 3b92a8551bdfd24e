pub mod errors;
pub mod outbound;
pub mod payment;

pub use errors::{ProxyError, Result};
pub use outbound::{OutboundCall, OutboundResult};
pub use payment::{QrisPayload, QrisQuery, QrisRequest};
