//! Runtime sessions
//!
//! A `Session` binds one agent/user pair to one initialized backend, remote
//! or spawned locally, and exposes the backend's operations as async calls.

mod session;

pub use session::Session;
