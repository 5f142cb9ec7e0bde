//! # Command Arguments
//!
//! Typed requests decoded from the loosely-typed argument objects hosts
//! send. Decoding is the validation step: a request that decodes is safe to
//! forward, and every failure names the offending field. Nothing here talks
//! to the native SDK.
//!
//! Optional numeric knobs stay `None` when the caller omitted them; the
//! bridge fills them from [`CommandDefaults`](core_runtime::CommandDefaults)
//! at call time.

use bridge_traits::JsonObject;
use core_schema::{
    Address, Coordinate, DesiredAccuracy, ForegroundServiceOptions, Location, RouteMode,
    RouteUnits, SdkLogLevel, TrackingOptions, TripOptions, TripStatus,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};

/// The argument object of one host call.
#[derive(Debug, Clone, Default)]
pub struct Args(JsonObject);

impl Args {
    /// `null` and a missing argument object are treated as `{}`.
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(object) => Ok(Self(object)),
            other => Err(CoreError::InvalidArguments(format!(
                "expected an argument object, got {}",
                type_name(&other)
            ))),
        }
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Empty strings count as absent.
    pub fn opt_str(&self, key: &str) -> Result<Option<String>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(expected(key, "a string", other)),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<String> {
        self.opt_str(key)?.ok_or_else(|| CoreError::missing(key))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(expected(key, "a boolean", other)),
        }
    }

    pub fn required_bool(&self, key: &str) -> Result<bool> {
        self.opt_bool(key)?.ok_or_else(|| CoreError::missing(key))
    }

    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| CoreError::invalid(key, "must be a finite number")),
            Some(other) => Err(expected(key, "a number", other)),
        }
    }

    /// Accepts integral floats (`10.0`) since JavaScript hosts have no
    /// integer type.
    pub fn opt_i32(&self, key: &str) -> Result<Option<i32>> {
        let Some(value) = self.opt_f64(key)? else {
            return Ok(None);
        };
        if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
            return Err(CoreError::invalid(key, "must be a whole number"));
        }
        Ok(Some(value as i32))
    }

    pub fn opt_object(&self, key: &str) -> Result<Option<JsonObject>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Object(object)) => Ok(Some(object.clone())),
            Some(other) => Err(expected(key, "an object", other)),
        }
    }

    pub fn required_object(&self, key: &str) -> Result<JsonObject> {
        self.opt_object(key)?.ok_or_else(|| CoreError::missing(key))
    }

    pub fn opt_strings(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(expected(key, "an array of strings", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(expected(key, "an array of strings", other)),
        }
    }

    pub fn opt_location(&self, key: &str) -> Result<Option<Location>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Object(object)) => location_from(key, object).map(Some),
            Some(other) => Err(expected(key, "a location object", other)),
        }
    }

    pub fn required_location(&self, key: &str) -> Result<Location> {
        self.opt_location(key)?
            .ok_or_else(|| CoreError::missing(key))
    }

    /// A location spread over the argument object itself
    /// (`{latitude, longitude, accuracy?}`). `None` when neither coordinate
    /// is present.
    pub fn inline_location(&self) -> Result<Option<Location>> {
        if !self.has("latitude") && !self.has("longitude") {
            return Ok(None);
        }
        location_from("", &self.0).map(Some)
    }

    pub fn required_locations(&self, key: &str) -> Result<Vec<Location>> {
        let items = match self.value(key) {
            None => return Err(CoreError::missing(key)),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(expected(key, "an array of locations", other)),
        };
        if items.is_empty() {
            return Err(CoreError::invalid(key, "must not be empty"));
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let field = format!("{key}[{index}]");
                match item {
                    Value::Object(object) => location_from(&field, object),
                    other => Err(expected(&field, "a location object", other)),
                }
            })
            .collect()
    }

    /// Decodes a strict enum: unknown spellings are rejected rather than
    /// guessed.
    pub fn opt_enum<T>(
        &self,
        key: &str,
        lookup: fn(&str) -> Option<T>,
        accepted: &str,
    ) -> Result<Option<T>> {
        match self.opt_str(key)? {
            None => Ok(None),
            Some(raw) => lookup(&raw)
                .map(Some)
                .ok_or_else(|| CoreError::invalid(key, format!("expected one of {accepted}"))),
        }
    }

    pub fn required_enum<T>(
        &self,
        key: &str,
        lookup: fn(&str) -> Option<T>,
        accepted: &str,
    ) -> Result<T> {
        self.opt_enum(key, lookup, accepted)?
            .ok_or_else(|| CoreError::missing(key))
    }

    pub fn route_mode(&self, key: &str) -> Result<RouteMode> {
        let raw = self.required_str(key)?;
        parse_route_mode(key, &raw)
    }

    pub fn route_modes(&self, key: &str) -> Result<Vec<RouteMode>> {
        let modes = self
            .opt_strings(key)?
            .ok_or_else(|| CoreError::missing(key))?;
        if modes.is_empty() {
            return Err(CoreError::invalid(key, "must not be empty"));
        }
        modes.iter().map(|raw| parse_route_mode(key, raw)).collect()
    }

    pub fn units(&self) -> Result<RouteUnits> {
        self.required_enum("units", RouteUnits::lookup, "metric, imperial")
    }

    /// Deserializes a nested options object with serde.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let object = self.required_object(key)?;
        serde_json::from_value(Value::Object(object))
            .map_err(|e| CoreError::invalid(key, e.to_string()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn expected(field: &str, what: &str, got: &Value) -> CoreError {
    CoreError::invalid(field, format!("expected {what}, got {}", type_name(got)))
}

fn nested(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Location validation shared by every coordinate-bearing argument.
fn location_from(field: &str, object: &JsonObject) -> Result<Location> {
    let coordinate = |key: &str| -> Result<f64> {
        match object.get(key).filter(|v| !v.is_null()) {
            None => Err(CoreError::missing(nested(field, key))),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| expected(&nested(field, key), "a number", value)),
        }
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    let label = if field.is_empty() { "location" } else { field };
    Coordinate::new(latitude, longitude).map_err(|e| CoreError::in_field(label, e))?;

    serde_json::from_value::<Location>(Value::Object(object.clone()))
        .map_err(|e| CoreError::invalid(label, e.to_string()))
}

fn parse_route_mode(field: &str, raw: &str) -> Result<RouteMode> {
    match RouteMode::lookup(raw) {
        Some(mode) if mode != RouteMode::Unknown => Ok(mode),
        _ => Err(CoreError::invalid(
            field,
            format!("unrecognized route mode `{raw}`"),
        )),
    }
}

const LOG_LEVELS: &str = "none, error, warning, info, debug";

/// Accepted spellings of a forced trip status.
const TRIP_STATUSES: &str = "started, approaching, arrived, completed, canceled, expired";

// ============================================================================
// Identity & configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeRequest {
    pub publishable_key: String,
}

impl InitializeRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            publishable_key: args.required_str("publishableKey")?,
        })
    }
}

pub fn log_level_from_args(args: &Args) -> Result<SdkLogLevel> {
    args.required_enum("level", SdkLogLevel::lookup, LOG_LEVELS)
}

pub fn metadata_from_args(args: &Args) -> Result<Option<JsonObject>> {
    args.opt_object("metadata")
}

// ============================================================================
// Location & tracking
// ============================================================================

/// `desiredAccuracy` falls back to `medium` (with a warning) when the value
/// is not recognized.
pub fn desired_accuracy_from_args(args: &Args) -> Result<DesiredAccuracy> {
    Ok(args
        .opt_str("desiredAccuracy")?
        .map(|raw| DesiredAccuracy::parse(&raw))
        .unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOnceRequest {
    /// Ask the device for a fresh fix.
    Device {
        desired_accuracy: DesiredAccuracy,
        beacons: bool,
    },
    /// Track with a caller-supplied location.
    Manual { location: Location },
}

impl Default for TrackOnceRequest {
    fn default() -> Self {
        TrackOnceRequest::Device {
            desired_accuracy: DesiredAccuracy::default(),
            beacons: false,
        }
    }
}

impl TrackOnceRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        if let Some(location) = args.inline_location()? {
            return Ok(TrackOnceRequest::Manual { location });
        }
        Ok(TrackOnceRequest::Device {
            desired_accuracy: desired_accuracy_from_args(args)?,
            beacons: args.opt_bool("beacons")?.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartTrackingVerifiedRequest {
    /// Seconds between token refreshes.
    pub interval: Option<i32>,
    pub beacons: bool,
}

impl StartTrackingVerifiedRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        let interval = args.opt_i32("interval")?;
        if interval.map_or(false, |i| i <= 0) {
            return Err(CoreError::invalid("interval", "must be greater than 0"));
        }
        Ok(Self {
            interval,
            beacons: args.opt_bool("beacons")?.unwrap_or(false),
        })
    }
}

pub fn tracking_options_from_args(args: &Args) -> Result<TrackingOptions> {
    args.decode("options")
}

pub fn foreground_service_options_from_args(args: &Args) -> Result<ForegroundServiceOptions> {
    args.decode("options")
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockTrackingRequest {
    pub origin: Location,
    pub destination: Location,
    pub mode: RouteMode,
    pub steps: Option<i32>,
    /// Seconds between simulated points.
    pub interval: Option<i32>,
}

impl MockTrackingRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        let request = Self {
            origin: args.required_location("origin")?,
            destination: args.required_location("destination")?,
            mode: args.route_mode("mode")?,
            steps: args.opt_i32("steps")?,
            interval: args.opt_i32("interval")?,
        };
        if request.steps.map_or(false, |s| s <= 0) {
            return Err(CoreError::invalid("steps", "must be greater than 0"));
        }
        if request.interval.map_or(false, |i| i <= 0) {
            return Err(CoreError::invalid("interval", "must be greater than 0"));
        }
        Ok(request)
    }
}

// ============================================================================
// Trips
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StartTripRequest {
    pub trip_options: TripOptions,
    pub tracking_options: Option<TrackingOptions>,
}

impl StartTripRequest {
    pub fn new(trip_options: TripOptions) -> Self {
        Self {
            trip_options,
            tracking_options: None,
        }
    }

    /// Accepts `{tripOptions, trackingOptions?}` at the top level or nested
    /// under `options`, and a flat `{options: TripOptions}`. The nested
    /// shape wins when both are present.
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.has("tripOptions") {
            if args.has("options") {
                debug!("startTrip received both `options` and `tripOptions`; using `tripOptions`");
            }
            return Self::from_nested(args, "");
        }

        let options = args.required_object("options")?;
        let inner = Args(options);
        if inner.has("tripOptions") {
            return Self::from_nested(&inner, "options");
        }
        Ok(Self::new(trip_options_from(&inner.0, "options")?))
    }

    fn from_nested(args: &Args, prefix: &str) -> Result<Self> {
        let trip = args.required_object("tripOptions")?;
        let trip_options = trip_options_from(&trip, &nested(prefix, "tripOptions"))?;
        let tracking_options = match args.opt_object("trackingOptions")? {
            None => None,
            Some(object) => Some(
                serde_json::from_value(Value::Object(object)).map_err(|e| {
                    CoreError::invalid(nested(prefix, "trackingOptions"), e.to_string())
                })?,
            ),
        };
        Ok(Self {
            trip_options,
            tracking_options,
        })
    }
}

fn trip_options_from(object: &JsonObject, field: &str) -> Result<TripOptions> {
    TripOptions::from_value(&Value::Object(object.clone())).map_err(|e| CoreError::in_field(field, e))
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTripRequest {
    pub options: TripOptions,
    /// `Unknown` leaves the status to the native SDK.
    pub status: TripStatus,
}

impl UpdateTripRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        let options = args.required_object("options")?;
        Ok(Self {
            options: trip_options_from(&options, "options")?,
            status: args
                .opt_enum("status", TripStatus::lookup, TRIP_STATUSES)?
                .unwrap_or(TripStatus::Unknown),
        })
    }
}

// ============================================================================
// Event verification
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEventRequest {
    pub event_id: String,
    pub verified_place_id: Option<String>,
}

impl AcceptEventRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            event_id: args.required_str("eventId")?,
            verified_place_id: args.opt_str("verifiedPlaceId")?,
        })
    }
}

// ============================================================================
// Backend pass-through
// ============================================================================

/// `near: None` searches around the device's current location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPlacesRequest {
    pub near: Option<Location>,
    pub radius: Option<i32>,
    pub chains: Option<Vec<String>>,
    pub chain_metadata: Option<JsonObject>,
    pub categories: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub limit: Option<i32>,
}

impl SearchPlacesRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            near: args.opt_location("near")?,
            radius: radius_from(args)?,
            chains: args.opt_strings("chains")?,
            chain_metadata: args.opt_object("chainMetadata")?,
            categories: args.opt_strings("categories")?,
            groups: args.opt_strings("groups")?,
            limit: limit_from(args)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchGeofencesRequest {
    pub near: Option<Location>,
    pub radius: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<JsonObject>,
    pub limit: Option<i32>,
    pub include_geometry: bool,
}

impl SearchGeofencesRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            near: args.opt_location("near")?,
            radius: radius_from(args)?,
            tags: args.opt_strings("tags")?,
            metadata: args.opt_object("metadata")?,
            limit: limit_from(args)?,
            include_geometry: args.opt_bool("includeGeometry")?.unwrap_or(false),
        })
    }
}

fn radius_from(args: &Args) -> Result<Option<i32>> {
    let radius = args.opt_i32("radius")?;
    if radius.map_or(false, |r| r <= 0) {
        return Err(CoreError::invalid("radius", "must be greater than 0"));
    }
    Ok(radius)
}

fn limit_from(args: &Args) -> Result<Option<i32>> {
    let limit = args.opt_i32("limit")?;
    if limit.map_or(false, |l| !(1..=100).contains(&l)) {
        return Err(CoreError::invalid("limit", "must be between 1 and 100"));
    }
    Ok(limit)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocompleteRequest {
    pub query: String,
    pub near: Option<Location>,
    pub layers: Option<Vec<String>>,
    pub limit: Option<i32>,
    pub country: Option<String>,
    pub expand_units: bool,
    pub mailable: bool,
}

impl AutocompleteRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            query: args.required_str("query")?,
            near: args.opt_location("near")?,
            layers: args.opt_strings("layers")?,
            limit: limit_from(args)?,
            country: args.opt_str("country")?,
            expand_units: args.opt_bool("expandUnits")?.unwrap_or(false),
            mailable: args.opt_bool("mailable")?.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeRequest {
    pub query: String,
    pub layers: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
}

impl GeocodeRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            query: args.required_str("query")?,
            layers: args.opt_strings("layers")?,
            countries: args.opt_strings("countries")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGeocodeRequest {
    pub location: Option<Location>,
    pub layers: Option<Vec<String>>,
}

impl ReverseGeocodeRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            location: args.inline_location()?,
            layers: args.opt_strings("layers")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRequest {
    /// `None` measures from the device's current location.
    pub origin: Option<Location>,
    pub destination: Location,
    pub modes: Vec<RouteMode>,
    pub units: RouteUnits,
}

impl DistanceRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            origin: args.opt_location("origin")?,
            destination: args.required_location("destination")?,
            modes: args.route_modes("modes")?,
            units: args.units()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRequest {
    pub origins: Vec<Location>,
    pub destinations: Vec<Location>,
    pub mode: RouteMode,
    pub units: RouteUnits,
}

impl MatrixRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            origins: args.required_locations("origins")?,
            destinations: args.required_locations("destinations")?,
            mode: args.route_mode("mode")?,
            units: args.units()?,
        })
    }
}

pub fn address_from_args(args: &Args) -> Result<Address> {
    args.decode("address")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionRequest {
    pub name: String,
    pub revenue: Option<f64>,
    pub metadata: Option<JsonObject>,
}

impl ConversionRequest {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            name: args.required_str("name")?,
            revenue: args.opt_f64("revenue")?,
            metadata: args.opt_object("metadata")?,
        })
    }
}
