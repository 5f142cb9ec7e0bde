//! # Native Bridge Traits
//!
//! The contract between the bridge core and the platform's native
//! location-tracking SDK.
//!
//! ## Overview
//!
//! The native SDK is a stateful singleton with a callback-driven API and a
//! single delegate slot. This crate describes that surface in Rust terms so
//! the core can be written, and tested, without a device:
//!
//! - [`LocationSdk`](sdk::LocationSdk) - every native command, one method per overload
//! - [`NativeReceiver`](sdk::NativeReceiver) - the delegate the SDK pushes updates into
//! - [`native`] - the SDK's own value shapes (sentinel-valued locations, raw
//!   status tokens, JSON entity dictionaries, option structs, completion replies)
//! - [`Operation`](operation::Operation) - the closed table of host commands
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](host_log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation | Status |
//! |----------|----------------|--------|
//! | Desktop / tests | `bridge-sim` | ✅ Available |
//! | iOS      | native shim    | 📋 Planned |
//! | Android  | native shim    | 📋 Planned |
//! | Web      | JS shim (partial, see [`LocationSdk::supports`](sdk::LocationSdk::supports)) | 📋 Planned |
//!
//! ## Thread Safety
//!
//! Native completions and delegate callbacks arrive on SDK-owned threads, so
//! every trait here requires `Send + Sync` on native targets (see
//! [`platform`]).

pub mod error;
pub mod host_log;
pub mod native;
pub mod operation;
pub mod platform;
pub mod sdk;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use native::{JsonObject, NativeLocation, NativeStatus};
pub use operation::{Operation, UnsupportedPolicy};
pub use sdk::{Completion, LocationSdk, NativeReceiver};
pub use host_log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
