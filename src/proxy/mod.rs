pub mod client;
pub mod decode;
pub mod headers;
pub mod retry;

pub use client::UpstreamClient;
