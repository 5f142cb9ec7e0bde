//! # Simulated Location SDK
//!
//! An in-memory [`LocationSdk`](bridge_traits::LocationSdk) for desktop
//! development and tests.
//!
//! ## Overview
//!
//! [`SimulatedSdk`] answers every command with plausible native-shaped data,
//! records each invocation (with overloads told apart by method name) and
//! lets tests script failures, drop completions, answer from other threads
//! and push delegate callbacks.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_sim::{CompletionMode, SimulatedSdk};
//!
//! let sdk = SimulatedSdk::new();
//! sdk.script_status("trackOnce", "ERROR_LOCATION");
//! sdk.set_completion_mode(CompletionMode::Threaded);
//!
//! // ... drive the bridge ...
//!
//! assert_eq!(sdk.calls_named("trackOnce").len(), 1);
//! ```

mod fixtures;
mod sdk;

pub use sdk::{CompletionMode, SdkCall, SimulatedSdk};
