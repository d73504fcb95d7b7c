//! Backend provisioning
//!
//! - `BackendLocator` - resolves a live endpoint (`RemoteLocator`, `SupervisedLocator`)
//! - `ProcessSupervisor` - spawns, probes and stops a local runtime process

mod locator;
mod supervisor;

pub use locator::{BackendLocator, LocatedBackend, RemoteLocator, SupervisedLocator};
pub use supervisor::ProcessSupervisor;
