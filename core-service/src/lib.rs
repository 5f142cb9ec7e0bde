//! Location bridge service and bootstrap helpers.
//!
//! This crate wires a host-provided [`LocationSdk`](bridge_traits::LocationSdk)
//! adapter into the bridge core: the typed command API
//! ([`LocationBridge`]), host dispatch by command name
//! ([`LocationBridge::dispatch`]), the trip lifecycle and the native delegate
//! relay feeding the event multiplexer. Desktop builds and tests typically
//! enable the `sim` feature, which supplies `bridge-sim`'s in-memory SDK.

pub mod bridge;
mod dispatch;
pub mod error;
mod relay;
pub mod requests;
pub mod responses;
pub mod trip;

pub use bridge::LocationBridge;
pub use error::{CoreError, Rejection, Result};

#[cfg(feature = "sim")]
pub use bridge_sim::SimulatedSdk;

#[cfg(feature = "sim")]
use std::sync::Arc;

#[cfg(feature = "sim")]
use core_runtime::config::BridgeConfig;

/// Builds a bridge over a fresh [`SimulatedSdk`] and returns both, so
/// callers can script the SDK and inspect its call log.
///
/// Must be called inside a tokio runtime.
#[cfg(feature = "sim")]
pub fn bootstrap_simulated() -> Result<(LocationBridge, Arc<SimulatedSdk>)> {
    let sdk = Arc::new(SimulatedSdk::new());
    let config = BridgeConfig::builder().sdk(sdk.clone()).build()?;
    let bridge = LocationBridge::new(config)?;
    Ok((bridge, sdk))
}
