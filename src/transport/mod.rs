//! HTTP transport to the runtime backend
//!
//! - `Route` - the fixed route table (path, method, timeout class)
//! - `RpcClient` - issues calls and maps failures to `TransportError`

mod client;
pub(crate) mod envelope;
mod routes;

pub use client::RpcClient;
pub use routes::Route;
