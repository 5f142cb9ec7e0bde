//! JSON dictionaries shaped like the native SDK's serializer output.

use bridge_traits::native::{
    JsonObject, NativeLocation, NativeRouteMode, NativeRouteUnits, NativeTripOptions,
    NativeTripStatus,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub(crate) fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(object) => object,
        _ => JsonObject::new(),
    }
}

pub(crate) fn point(location: &NativeLocation) -> Value {
    json!({
        "type": "Point",
        "coordinates": [location.longitude, location.latitude],
    })
}

pub(crate) fn mode_token(mode: NativeRouteMode) -> &'static str {
    match mode {
        NativeRouteMode::Foot => "foot",
        NativeRouteMode::Bike => "bike",
        NativeRouteMode::Car => "car",
        NativeRouteMode::Truck => "truck",
        NativeRouteMode::Motorbike => "motorbike",
    }
}

pub(crate) fn trip_status_token(status: NativeTripStatus) -> &'static str {
    match status {
        NativeTripStatus::Unknown => "unknown",
        NativeTripStatus::Started => "started",
        NativeTripStatus::Approaching => "approaching",
        NativeTripStatus::Arrived => "arrived",
        NativeTripStatus::Expired => "expired",
        NativeTripStatus::Completed => "completed",
        NativeTripStatus::Canceled => "canceled",
    }
}

pub(crate) struct UserFixture<'a> {
    pub id: &'a str,
    pub user_id: Option<&'a str>,
    pub description: Option<&'a str>,
    pub metadata: Option<&'a JsonObject>,
    pub location: &'a NativeLocation,
    pub stopped: bool,
    pub trip: Option<JsonObject>,
}

pub(crate) fn user(fixture: UserFixture<'_>) -> JsonObject {
    let mut user = object(json!({
        "_id": fixture.id,
        "location": point(fixture.location),
        "stopped": fixture.stopped,
        "foreground": true,
        "geofences": [],
    }));
    if fixture.location.horizontal_accuracy >= 0.0 {
        user.insert(
            "locationAccuracy".into(),
            json!(fixture.location.horizontal_accuracy),
        );
    }
    if let Some(user_id) = fixture.user_id {
        user.insert("userId".into(), json!(user_id));
    }
    if let Some(description) = fixture.description {
        user.insert("description".into(), json!(description));
    }
    if let Some(metadata) = fixture.metadata {
        user.insert("metadata".into(), Value::Object(metadata.clone()));
    }
    if let Some(trip) = fixture.trip {
        user.insert("trip".into(), Value::Object(trip));
    }
    user
}

pub(crate) fn trip(id: &str, options: &NativeTripOptions, status: NativeTripStatus) -> JsonObject {
    let mut trip = object(json!({
        "_id": id,
        "externalId": options.external_id,
        "mode": mode_token(options.mode),
        "status": trip_status_token(status),
    }));
    if let Some(tag) = &options.destination_geofence_tag {
        trip.insert("destinationGeofenceTag".into(), json!(tag));
    }
    if let Some(external_id) = &options.destination_geofence_external_id {
        trip.insert("destinationGeofenceExternalId".into(), json!(external_id));
    }
    if let Some(metadata) = &options.metadata {
        trip.insert("metadata".into(), Value::Object(metadata.clone()));
    }
    if let Some(arrival) = options.scheduled_arrival_at {
        trip.insert("scheduledArrivalAt".into(), json!(arrival.to_rfc3339()));
    }
    trip
}

pub(crate) fn event(id: &str, event_type: &str, created_at: DateTime<Utc>) -> JsonObject {
    object(json!({
        "_id": id,
        "type": event_type,
        "createdAt": created_at.to_rfc3339(),
        "live": false,
        "confidence": 3,
    }))
}

pub(crate) fn token(user: JsonObject, now: DateTime<Utc>, id: &str) -> JsonObject {
    object(json!({
        "user": user,
        "events": [],
        "token": format!("sim.{id}"),
        "expiresAt": (now + Duration::hours(1)).to_rfc3339(),
        "expiresIn": 3600,
        "passed": true,
    }))
}

/// A fixed route per requested mode; the simulator does not compute routes.
pub(crate) fn route(units: NativeRouteUnits) -> JsonObject {
    let (value, text) = match units {
        NativeRouteUnits::Metric => (1000.0, "1.0 km"),
        NativeRouteUnits::Imperial => (3281.0, "0.6 mi"),
    };
    object(json!({
        "distance": {"value": value, "text": text},
        "duration": {"value": 4.0, "text": "4 mins"},
    }))
}

pub(crate) fn routes(modes: &[NativeRouteMode], units: NativeRouteUnits) -> JsonObject {
    let mut routes = object(json!({"geodesic": route(units)}));
    for mode in modes {
        routes.insert(mode_token(*mode).into(), Value::Object(route(units)));
    }
    routes
}

pub(crate) fn default_address() -> JsonObject {
    object(json!({
        "latitude": 40.7041895,
        "longitude": -73.9867797,
        "formattedAddress": "20 Jay Street, Brooklyn, New York, NY 11201 USA",
        "country": "United States",
        "countryCode": "US",
        "state": "New York",
        "stateCode": "NY",
        "postalCode": "11201",
        "city": "Brooklyn",
        "number": "20",
        "street": "Jay Street",
        "layer": "address",
        "confidence": "exact",
    }))
}
