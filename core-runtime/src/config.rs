//! # Bridge Configuration Module
//!
//! Provides configuration management for the location bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` instance that holds the native SDK adapter and the settings
//! the command dispatcher needs. It enforces fail-fast validation so a bridge
//! is never constructed without a native SDK to talk to.
//!
//! ## Required Dependencies
//!
//! - `LocationSdk` - The native SDK adapter every command is forwarded to
//!
//! When the `sim` feature is enabled, the in-memory `SimulatedSdk` is injected
//! automatically if no adapter is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .sdk(Arc::new(MyPlatformSdk::new()))
//!     .event_buffer_size(256)
//!     .allow_trip_replacement(false)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Without the `sim` feature, a missing adapter fails with an actionable
//! message:
//!
//! ```ignore
//! let err = BridgeConfig::builder().build().unwrap_err();
//! assert!(err.to_string().contains("LocationSdk"));
//! ```

use crate::error::{Error, Result};
use bridge_traits::LocationSdk;
use std::sync::Arc;

/// Configuration for a bridge instance.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Native SDK adapter (required)
    pub sdk: Arc<dyn LocationSdk>,

    /// Capacity of the broadcast channel behind `EventMultiplexer::subscribe`
    pub event_buffer_size: usize,

    /// Feature flags
    pub features: FeatureFlags,

    /// Values substituted for optional command arguments
    pub defaults: CommandDefaults,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("sdk", &"LocationSdk { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Feature flags control optional bridge behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Let `startTrip` replace an active trip instead of failing
    pub allow_trip_replacement: bool,

    /// Mirror native `log` delegate messages into `tracing` at debug level
    pub forward_native_logs: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            allow_trip_replacement: false,
            forward_native_logs: true,
        }
    }
}

/// Documented defaults for optional canonical fields that the native API
/// requires as primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandDefaults {
    /// Search radius in meters for place and geofence searches
    pub search_radius: i32,

    /// Result limit for searches and autocomplete
    pub search_limit: i32,

    /// Horizontal accuracy given to caller-supplied coordinates that have none
    pub fixed_location_accuracy: f64,

    /// Number of simulated points for `mockTracking`
    pub mock_steps: i32,

    /// Seconds between simulated points for `mockTracking`
    pub mock_interval_secs: i32,

    /// Token refresh interval for `startTrackingVerified`
    pub verified_interval_secs: i32,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            search_radius: 1000,
            search_limit: 10,
            fixed_location_accuracy: 5.0,
            mock_steps: 10,
            mock_interval_secs: 1,
            verified_interval_secs: 1200,
        }
    }
}

impl CommandDefaults {
    pub fn validate(&self) -> Result<()> {
        if self.search_radius <= 0 {
            return Err(Error::Config(
                "Default search radius must be greater than 0 meters".to_string(),
            ));
        }

        if !(1..=100).contains(&self.search_limit) {
            return Err(Error::Config(
                "Default search limit must be between 1 and 100".to_string(),
            ));
        }

        if !self.fixed_location_accuracy.is_finite() || self.fixed_location_accuracy < 0.0 {
            return Err(Error::Config(
                "Fixed location accuracy must be a non-negative number".to_string(),
            ));
        }

        if self.mock_steps <= 0 {
            return Err(Error::Config(
                "Default mock tracking steps must be greater than 0".to_string(),
            ));
        }

        if self.mock_interval_secs <= 0 || self.verified_interval_secs <= 0 {
            return Err(Error::Config(
                "Default intervals must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.defaults.validate()
    }
}

#[cfg(not(feature = "sim"))]
fn sdk_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "LocationSdk".to_string(),
        message: "LocationSdk implementation is required to forward commands to the native SDK. \
                 Desktop/tests: enable the 'sim' feature to use the default SimulatedSdk. \
                 iOS: inject an adapter over the native framework's delegate API. \
                 Android: inject an adapter over the native receiver and callbacks."
            .to_string(),
    }
}

#[cfg(feature = "sim")]
fn provide_default_sdk() -> Result<Arc<dyn LocationSdk>> {
    use bridge_sim::SimulatedSdk;

    let sdk: Arc<dyn LocationSdk> = Arc::new(SimulatedSdk::new());
    Ok(sdk)
}

#[cfg(not(feature = "sim"))]
fn provide_default_sdk() -> Result<Arc<dyn LocationSdk>> {
    Err(sdk_missing_error())
}

/// Builder for constructing [`BridgeConfig`] instances.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    sdk: Option<Arc<dyn LocationSdk>>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
    defaults: Option<CommandDefaults>,
}

impl BridgeConfigBuilder {
    /// Sets the native SDK adapter.
    pub fn sdk(mut self, sdk: Arc<dyn LocationSdk>) -> Self {
        self.sdk = Some(sdk);
        self
    }

    /// Sets the broadcast capacity for event stream subscribers (default 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn allow_trip_replacement(mut self, enabled: bool) -> Self {
        self.features.allow_trip_replacement = enabled;
        self
    }

    pub fn forward_native_logs(mut self, enabled: bool) -> Self {
        self.features.forward_native_logs = enabled;
        self
    }

    pub fn defaults(mut self, defaults: CommandDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Builds the final configuration, injecting the default adapter when one
    /// is available and validating every setting.
    pub fn build(self) -> Result<BridgeConfig> {
        let sdk = match self.sdk {
            Some(sdk) => sdk,
            None => provide_default_sdk()?,
        };

        let config = BridgeConfig {
            sdk,
            event_buffer_size: self.event_buffer_size.unwrap_or(100),
            features: self.features,
            defaults: self.defaults.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
