//! # Core Runtime Module
//!
//! Provides the runtime infrastructure the location bridge is assembled on:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - The event multiplexer that fans native callbacks out to listeners
//!
//! ## Overview
//!
//! This crate holds no command logic. It establishes the logging conventions,
//! the fail-fast configuration rules and the single delivery context used by
//! `core-service`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder, CommandDefaults, FeatureFlags};
pub use error::{Error, Result};
pub use events::{BridgeEvent, BridgeEventKind, EventMultiplexer, EventStream, ListenerHandle};
