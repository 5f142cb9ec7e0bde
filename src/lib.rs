//! Workspace facade crate.
//!
//! Host shells depend on `location-bridge` and pick features instead of
//! wiring each workspace crate: `core` exposes the bridge crates and `sim`
//! (on by default) adds the in-memory SDK used for desktop runs and tests.

#[cfg(feature = "core")]
pub use bridge_traits as traits;
#[cfg(feature = "core")]
pub use core_runtime as runtime;
#[cfg(feature = "core")]
pub use core_schema as schema;
#[cfg(feature = "core")]
pub use core_service as service;

#[cfg(feature = "core")]
pub use core_service::{CoreError, LocationBridge, Rejection};

#[cfg(feature = "sim")]
pub use core_service::{bootstrap_simulated, SimulatedSdk};
