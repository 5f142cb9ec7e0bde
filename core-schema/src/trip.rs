//! Trips
//!
//! Trip options as supplied by the host, the canonical trip record, and the
//! status lattice the bridge enforces for forced transitions:
//!
//! ```text
//! unknown -> started -> approaching -> arrived -> completed
//!              \____________\______________\_____> canceled | expired
//! ```

use bridge_traits::native::{
    JsonObject, NativeRouteMode, NativeRouteUnits, NativeTripOptions, NativeTripStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::string_enum;
use crate::error::{Result, SchemaError};
use crate::location::Coordinate;
use crate::reader::ObjectReader;

string_enum! {
    pub enum RouteMode {
        Foot => "foot",
        Bike => "bike",
        Car => "car",
        Truck => "truck",
        Motorbike => "motorbike",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

impl RouteMode {
    /// `None` for [`RouteMode::Unknown`]; an unrecognized mode is never
    /// forwarded as some concrete mode.
    pub fn to_native(self) -> Option<NativeRouteMode> {
        match self {
            RouteMode::Foot => Some(NativeRouteMode::Foot),
            RouteMode::Bike => Some(NativeRouteMode::Bike),
            RouteMode::Car => Some(NativeRouteMode::Car),
            RouteMode::Truck => Some(NativeRouteMode::Truck),
            RouteMode::Motorbike => Some(NativeRouteMode::Motorbike),
            RouteMode::Unknown => None,
        }
    }

    pub fn from_native(native: NativeRouteMode) -> Self {
        match native {
            NativeRouteMode::Foot => RouteMode::Foot,
            NativeRouteMode::Bike => RouteMode::Bike,
            NativeRouteMode::Car => RouteMode::Car,
            NativeRouteMode::Truck => RouteMode::Truck,
            NativeRouteMode::Motorbike => RouteMode::Motorbike,
        }
    }

    pub fn require_native(self, field: &str) -> Result<NativeRouteMode> {
        self.to_native()
            .ok_or_else(|| SchemaError::invalid(field, "unrecognized route mode"))
    }
}

string_enum! {
    pub enum RouteUnits {
        Metric => "metric",
        Imperial => "imperial",
    }
}

impl RouteUnits {
    pub fn to_native(self) -> NativeRouteUnits {
        match self {
            RouteUnits::Metric => NativeRouteUnits::Metric,
            RouteUnits::Imperial => NativeRouteUnits::Imperial,
        }
    }
}

string_enum! {
    pub enum TripStatus {
        Unknown => "unknown",
        Started => "started",
        Approaching => "approaching",
        Arrived => "arrived",
        Expired => "expired",
        Completed => "completed",
        Canceled => "canceled" | "cancelled",
    }
    fallback = Unknown;
}

impl TripStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TripStatus::Expired | TripStatus::Completed | TripStatus::Canceled
        )
    }

    fn progress(self) -> u8 {
        match self {
            TripStatus::Unknown => 0,
            TripStatus::Started => 1,
            TripStatus::Approaching => 2,
            TripStatus::Arrived => 3,
            TripStatus::Expired | TripStatus::Completed | TripStatus::Canceled => 4,
        }
    }

    /// Whether a caller may force the trip from `self` to `next`.
    ///
    /// Terminal states are final, progress never moves backwards and
    /// `unknown` is never a target. Staying in the current state is allowed.
    pub fn can_transition_to(self, next: TripStatus) -> bool {
        if self.is_terminal() || next == TripStatus::Unknown {
            return false;
        }
        next.is_terminal() || next.progress() >= self.progress()
    }

    pub fn to_native(self) -> NativeTripStatus {
        match self {
            TripStatus::Unknown => NativeTripStatus::Unknown,
            TripStatus::Started => NativeTripStatus::Started,
            TripStatus::Approaching => NativeTripStatus::Approaching,
            TripStatus::Arrived => NativeTripStatus::Arrived,
            TripStatus::Expired => NativeTripStatus::Expired,
            TripStatus::Completed => NativeTripStatus::Completed,
            TripStatus::Canceled => NativeTripStatus::Canceled,
        }
    }
}

/// Trip options supplied by the host. `externalId` is the caller's
/// correlation key and is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripOptions {
    pub external_id: String,
    #[serde(default)]
    pub destination_geofence_tag: Option<String>,
    #[serde(default)]
    pub destination_geofence_external_id: Option<String>,
    #[serde(default)]
    pub mode: Option<RouteMode>,
    #[serde(default)]
    pub scheduled_arrival_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<JsonObject>,
    /// Minutes before arrival at which the trip becomes `approaching`.
    #[serde(default)]
    pub approaching_threshold: Option<i32>,
}

impl TripOptions {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            destination_geofence_tag: None,
            destination_geofence_external_id: None,
            mode: None,
            scheduled_arrival_at: None,
            metadata: None,
            approaching_threshold: None,
        }
    }

    /// Decode host-supplied options, naming `externalId` when it is missing.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(SchemaError::invalid("options", "expected an object"));
        };
        match object.get("externalId") {
            Some(Value::String(id)) if !id.is_empty() => {}
            Some(Value::String(_)) => {
                return Err(SchemaError::invalid("externalId", "must not be empty"));
            }
            None | Some(Value::Null) => {
                return Err(SchemaError::missing("TripOptions", "externalId"));
            }
            Some(_) => return Err(SchemaError::invalid("externalId", "expected a string")),
        }
        serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::invalid("options", e.to_string()))
    }

    pub fn to_native(&self) -> Result<NativeTripOptions> {
        let mode = match self.mode {
            Some(mode) => mode.require_native("mode")?,
            None => NativeRouteMode::Car,
        };
        let approaching_threshold = self.approaching_threshold.unwrap_or(0);
        if approaching_threshold < 0 {
            return Err(SchemaError::invalid(
                "approachingThreshold",
                "must not be negative",
            ));
        }
        Ok(NativeTripOptions {
            external_id: self.external_id.clone(),
            destination_geofence_tag: self.destination_geofence_tag.clone(),
            destination_geofence_external_id: self.destination_geofence_external_id.clone(),
            mode,
            scheduled_arrival_at: self.scheduled_arrival_at,
            metadata: self.metadata.clone(),
            approaching_threshold,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEta {
    /// Meters.
    pub distance: Option<f64>,
    /// Minutes.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Server identifier; absent until the backend has acknowledged the trip.
    pub id: Option<String>,
    pub external_id: String,
    pub metadata: Option<JsonObject>,
    pub destination_geofence_tag: Option<String>,
    pub destination_geofence_external_id: Option<String>,
    pub destination_location: Option<Coordinate>,
    pub mode: Option<RouteMode>,
    pub eta: Option<TripEta>,
    pub status: TripStatus,
    pub scheduled_arrival_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Trip", object);
        Ok(Self {
            id: r.opt_id(),
            external_id: r.required_str("externalId")?,
            metadata: r.opt_object("metadata"),
            destination_geofence_tag: r.opt_str("destinationGeofenceTag"),
            destination_geofence_external_id: r.opt_str("destinationGeofenceExternalId"),
            destination_location: r.point("destinationLocation")?,
            mode: r.opt_str("mode").map(|m| RouteMode::parse(&m)),
            eta: r.entity("eta", |eta| {
                let e = ObjectReader::new("TripEta", eta);
                Ok(TripEta {
                    distance: e.opt_f64("distance"),
                    duration: e.opt_f64("duration"),
                })
            })?,
            status: r
                .opt_str("status")
                .map(|s| TripStatus::parse(&s))
                .unwrap_or(TripStatus::Unknown),
            scheduled_arrival_at: r.opt_timestamp("scheduledArrivalAt"),
        })
    }

    /// Local record for a trip the SDK accepted without echoing it back.
    pub fn from_options(options: &TripOptions, status: TripStatus) -> Self {
        Self {
            id: None,
            external_id: options.external_id.clone(),
            metadata: options.metadata.clone(),
            destination_geofence_tag: options.destination_geofence_tag.clone(),
            destination_geofence_external_id: options.destination_geofence_external_id.clone(),
            destination_location: None,
            mode: options.mode,
            eta: None,
            status,
            scheduled_arrival_at: options.scheduled_arrival_at,
        }
    }
}
