//! Native Value Shapes
//!
//! Values exchanged with the native location SDK, in the SDK's own
//! conventions. Nothing here is canonical: negative accuracies mean "not
//! supplied", statuses are raw tokens in whatever spelling the platform uses,
//! and backend entities arrive as the SDK serializer's JSON dictionaries.
//! Conversion to the stable schema lives in `core-schema`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// JSON dictionary as produced by the native SDK serializers
/// (`toJson()` / `dictionaryValue()`).
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Sentinel the native location APIs use for "value not available".
pub const INVALID_MEASUREMENT: f64 = -1.0;

// ============================================================================
// Status
// ============================================================================

/// Raw status token reported by the native SDK.
///
/// Platforms disagree on spelling (`ERROR_LOCATION` vs `errorLocation`), and
/// newer SDK releases add values, so the token is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NativeStatus(String);

impl NativeStatus {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn success() -> Self {
        Self::new("SUCCESS")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NativeStatus {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Location
// ============================================================================

/// A device or manual location in the native representation.
///
/// Accuracy-bearing fields use [`INVALID_MEASUREMENT`] (any negative value)
/// when the platform did not supply them. Zero is a valid measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy: f64,
    pub altitude: Option<f64>,
    pub vertical_accuracy: f64,
    pub speed: f64,
    pub speed_accuracy: f64,
    pub course: f64,
    pub course_accuracy: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub mocked: bool,
}

impl NativeLocation {
    /// Location with only a coordinate; every measurement is marked invalid.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy: INVALID_MEASUREMENT,
            altitude: None,
            vertical_accuracy: INVALID_MEASUREMENT,
            speed: INVALID_MEASUREMENT,
            speed_accuracy: INVALID_MEASUREMENT,
            course: INVALID_MEASUREMENT,
            course_accuracy: INVALID_MEASUREMENT,
            timestamp: None,
            mocked: false,
        }
    }

    pub fn with_horizontal_accuracy(mut self, accuracy: f64) -> Self {
        self.horizontal_accuracy = accuracy;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// What produced a client location update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeLocationSource {
    ForegroundLocation,
    BackgroundLocation,
    ManualLocation,
    VisitArrival,
    VisitDeparture,
    GeofenceEnter,
    GeofenceDwell,
    GeofenceExit,
    MockLocation,
    BeaconEnter,
    BeaconExit,
    Unknown,
}

// ============================================================================
// Native enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NativeDesiredAccuracy {
    High,
    Medium,
    Low,
    None,
}

/// OS authorization state as reported by the platform location manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
    /// The platform exposes no permissions API at all.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeTripStatus {
    Unknown,
    Started,
    Approaching,
    Arrived,
    Expired,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NativeRouteMode {
    Foot,
    Bike,
    Car,
    Truck,
    Motorbike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeRouteUnits {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeLogLevel {
    None,
    Error,
    Warning,
    Info,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeReplay {
    Stops,
    None,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NativeSync {
    None,
    StopsAndExits,
    All,
}

// ============================================================================
// Options handed to the SDK
// ============================================================================

/// Tracking configuration in the SDK's primitive representation.
///
/// Every field is non-optional here; the native API has no notion of an
/// unset interval or radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeTrackingOptions {
    pub desired_stopped_update_interval: i32,
    pub desired_moving_update_interval: i32,
    pub desired_sync_interval: i32,
    pub desired_accuracy: NativeDesiredAccuracy,
    pub stop_duration: i32,
    pub stop_distance: i32,
    pub start_tracking_after: Option<DateTime<Utc>>,
    pub stop_tracking_after: Option<DateTime<Utc>>,
    pub replay: NativeReplay,
    pub sync: NativeSync,
    pub use_stopped_geofence: bool,
    pub stopped_geofence_radius: i32,
    pub use_moving_geofence: bool,
    pub moving_geofence_radius: i32,
    pub sync_geofences: bool,
    pub sync_geofences_limit: i32,
    pub foreground_service_enabled: bool,
    pub beacons: bool,
}

impl NativeTrackingOptions {
    /// Low battery usage; updates about every 20 minutes while moving.
    pub fn efficient() -> Self {
        Self {
            desired_stopped_update_interval: 3600,
            desired_moving_update_interval: 1200,
            desired_sync_interval: 1200,
            desired_accuracy: NativeDesiredAccuracy::Medium,
            stop_duration: 140,
            stop_distance: 70,
            start_tracking_after: None,
            stop_tracking_after: None,
            replay: NativeReplay::Stops,
            sync: NativeSync::All,
            use_stopped_geofence: false,
            stopped_geofence_radius: 0,
            use_moving_geofence: false,
            moving_geofence_radius: 0,
            sync_geofences: true,
            sync_geofences_limit: 10,
            foreground_service_enabled: false,
            beacons: false,
        }
    }

    /// Balanced preset with stopped/moving geofences.
    pub fn responsive() -> Self {
        Self {
            desired_stopped_update_interval: 0,
            desired_moving_update_interval: 150,
            desired_sync_interval: 20,
            use_stopped_geofence: true,
            stopped_geofence_radius: 100,
            use_moving_geofence: true,
            moving_geofence_radius: 100,
            ..Self::efficient()
        }
    }

    /// Frequent high-accuracy updates; requires a foreground service on Android.
    pub fn continuous() -> Self {
        Self {
            desired_stopped_update_interval: 30,
            desired_moving_update_interval: 30,
            desired_sync_interval: 20,
            desired_accuracy: NativeDesiredAccuracy::High,
            replay: NativeReplay::None,
            foreground_service_enabled: true,
            ..Self::efficient()
        }
    }
}

/// Android foreground service notification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NativeForegroundServiceOptions {
    pub text: Option<String>,
    pub title: Option<String>,
    pub update_existing: bool,
    pub activity: Option<String>,
    pub importance: Option<i32>,
    pub id: Option<i32>,
    pub channel_name: Option<String>,
    pub icon_string: Option<String>,
    pub icon_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeTripOptions {
    pub external_id: String,
    pub destination_geofence_tag: Option<String>,
    pub destination_geofence_external_id: Option<String>,
    pub mode: NativeRouteMode,
    pub scheduled_arrival_at: Option<DateTime<Utc>>,
    pub metadata: Option<JsonObject>,
    /// Minutes; `0` lets the SDK use its server-side default.
    pub approaching_threshold: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceSearch {
    pub radius: i32,
    pub chains: Option<Vec<String>>,
    pub chain_metadata: Option<JsonObject>,
    pub categories: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub limit: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceSearch {
    pub radius: i32,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<JsonObject>,
    pub limit: i32,
    pub include_geometry: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteQuery {
    pub query: String,
    pub near: Option<NativeLocation>,
    pub layers: Option<Vec<String>>,
    pub limit: i32,
    pub country: Option<String>,
    pub expand_units: bool,
    pub mailable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeQuery {
    pub address: String,
    pub layers: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteQuery {
    pub modes: Vec<NativeRouteMode>,
    pub units: NativeRouteUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixQuery {
    pub origins: Vec<NativeLocation>,
    pub destinations: Vec<NativeLocation>,
    pub mode: NativeRouteMode,
    pub units: NativeRouteUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockTrackingRequest {
    pub origin: NativeLocation,
    pub destination: NativeLocation,
    pub mode: NativeRouteMode,
    pub steps: i32,
    pub interval_secs: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
    pub name: String,
    pub revenue: Option<f64>,
    pub metadata: Option<JsonObject>,
}

// ============================================================================
// Completion replies
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocationReply {
    pub status: NativeStatus,
    pub location: Option<NativeLocation>,
    pub stopped: bool,
}

#[derive(Debug, Clone)]
pub struct TrackReply {
    pub status: NativeStatus,
    pub location: Option<NativeLocation>,
    pub events: Option<Vec<JsonObject>>,
    pub user: Option<JsonObject>,
}

#[derive(Debug, Clone)]
pub struct TokenReply {
    pub status: NativeStatus,
    pub token: Option<JsonObject>,
}

#[derive(Debug, Clone)]
pub struct TripReply {
    pub status: NativeStatus,
    pub trip: Option<JsonObject>,
    pub events: Option<Vec<JsonObject>>,
}

#[derive(Debug, Clone)]
pub struct ContextReply {
    pub status: NativeStatus,
    pub location: Option<NativeLocation>,
    pub context: Option<JsonObject>,
}

#[derive(Debug, Clone)]
pub struct SearchPlacesReply {
    pub status: NativeStatus,
    pub location: Option<NativeLocation>,
    pub places: Option<Vec<JsonObject>>,
}

#[derive(Debug, Clone)]
pub struct SearchGeofencesReply {
    pub status: NativeStatus,
    pub location: Option<NativeLocation>,
    pub geofences: Option<Vec<JsonObject>>,
}

#[derive(Debug, Clone)]
pub struct GeocodeReply {
    pub status: NativeStatus,
    pub addresses: Option<Vec<JsonObject>>,
}

#[derive(Debug, Clone)]
pub struct IpGeocodeReply {
    pub status: NativeStatus,
    pub address: Option<JsonObject>,
    pub proxy: bool,
}

#[derive(Debug, Clone)]
pub struct RouteReply {
    pub status: NativeStatus,
    pub routes: Option<JsonObject>,
}

#[derive(Debug, Clone)]
pub struct MatrixReply {
    pub status: NativeStatus,
    /// Rows indexed by origin, columns by destination.
    pub matrix: Option<Vec<Vec<JsonObject>>>,
}

#[derive(Debug, Clone)]
pub struct ValidateAddressReply {
    pub status: NativeStatus,
    pub address: Option<JsonObject>,
    pub verification_status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConversionReply {
    pub status: NativeStatus,
    pub event: Option<JsonObject>,
}
