//! Backend Entities
//!
//! Canonical records built from the native SDK's JSON dictionaries. Every
//! optional native field maps to a nullable field here; nothing is defaulted.
//! Collections are `None` when the payload omitted them and `Some(vec![])`
//! only when it sent an empty list.

use bridge_traits::native::JsonObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::string_enum;
use crate::error::Result;
use crate::location::{Coordinate, Location};
use crate::reader::ObjectReader;
use crate::trip::Trip;

// ============================================================================
// Enums
// ============================================================================

string_enum! {
    pub enum EventType {
        Unknown => "unknown",
        UserEnteredGeofence => "user.entered_geofence",
        UserExitedGeofence => "user.exited_geofence",
        UserDwelledInGeofence => "user.dwelled_in_geofence",
        UserEnteredHome => "user.entered_home",
        UserExitedHome => "user.exited_home",
        UserEnteredOffice => "user.entered_office",
        UserExitedOffice => "user.exited_office",
        UserStartedTraveling => "user.started_traveling",
        UserStoppedTraveling => "user.stopped_traveling",
        UserStartedCommuting => "user.started_commuting",
        UserStoppedCommuting => "user.stopped_commuting",
        UserEnteredPlace => "user.entered_place",
        UserExitedPlace => "user.exited_place",
        UserNearbyPlaceChain => "user.nearby_place_chain",
        UserEnteredRegionCountry => "user.entered_region_country",
        UserExitedRegionCountry => "user.exited_region_country",
        UserEnteredRegionState => "user.entered_region_state",
        UserExitedRegionState => "user.exited_region_state",
        UserEnteredRegionDma => "user.entered_region_dma",
        UserExitedRegionDma => "user.exited_region_dma",
        UserEnteredRegionPostalCode => "user.entered_region_postal_code",
        UserExitedRegionPostalCode => "user.exited_region_postal_code",
        UserStartedTrip => "user.started_trip",
        UserUpdatedTrip => "user.updated_trip",
        UserApproachingTripDestination => "user.approaching_trip_destination",
        UserArrivedAtTripDestination => "user.arrived_at_trip_destination",
        UserArrivedAtWrongTripDestination => "user.arrived_at_wrong_trip_destination",
        UserStoppedTrip => "user.stopped_trip",
        UserEnteredBeacon => "user.entered_beacon",
        UserExitedBeacon => "user.exited_beacon",
        UserFailedFraud => "user.failed_fraud",
    }
    fallback = Unknown;
}

string_enum! {
    pub enum EventConfidence {
        None => "none",
        Low => "low",
        Medium => "medium",
        High => "high",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

impl EventConfidence {
    /// Native payloads carry confidence as an integer 0-3; some platforms
    /// send the name instead.
    pub fn from_native(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => EventConfidence::None,
                Some(1) => EventConfidence::Low,
                Some(2) => EventConfidence::Medium,
                Some(3) => EventConfidence::High,
                _ => EventConfidence::Unknown,
            },
            Some(Value::String(s)) => EventConfidence::parse(s),
            _ => EventConfidence::Unknown,
        }
    }
}

string_enum! {
    pub enum EventVerification {
        Accept => "accept" | "accepted",
        Unverify => "unverify" | "unverified",
        Reject => "reject" | "rejected",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

impl EventVerification {
    pub fn from_native(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => EventVerification::Accept,
                Some(0) => EventVerification::Unverify,
                Some(-1) => EventVerification::Reject,
                _ => EventVerification::Unknown,
            },
            Some(Value::String(s)) => EventVerification::parse(s),
            _ => EventVerification::Unknown,
        }
    }
}

string_enum! {
    pub enum GeofenceGeometry {
        Circle => "circle",
        Polygon => "polygon",
        Isochrone => "isochrone",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

string_enum! {
    pub enum AddressConfidence {
        Exact => "exact",
        Interpolated => "interpolated",
        Fallback => "fallback",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

string_enum! {
    pub enum AddressVerificationStatus {
        Verified => "verified",
        PartiallyVerified => "partiallyVerified",
        Ambiguous => "ambiguous",
        Unverified => "unverified",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub metadata: Option<JsonObject>,
}

impl Chain {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Chain", object);
        Ok(Self {
            slug: r.opt_str("slug"),
            name: r.opt_str("name"),
            external_id: r.opt_str("externalId"),
            metadata: r.opt_object("metadata"),
        })
    }
}

/// Country, state, DMA or postal code membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    #[serde(rename = "type")]
    pub region_type: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub flag: Option<String>,
}

impl Region {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Region", object);
        Ok(Self {
            id: r.id()?,
            region_type: r.opt_str("type"),
            code: r.opt_str("code"),
            name: r.opt_str("name"),
            flag: r.opt_str("flag"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: Option<String>,
    pub categories: Option<Vec<String>>,
    pub chain: Option<Chain>,
    pub location: Option<Coordinate>,
    pub group: Option<String>,
    pub metadata: Option<JsonObject>,
}

impl Place {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Place", object);
        Ok(Self {
            id: r.id()?,
            name: r.opt_str("name"),
            categories: r.opt_strings("categories"),
            chain: r.entity("chain", Chain::from_json)?,
            location: r.point("location")?,
            group: r.opt_str("group"),
            metadata: r.opt_object("metadata"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub external_id: Option<String>,
    pub metadata: Option<JsonObject>,
    pub geometry: GeofenceGeometry,
    pub geometry_center: Option<Coordinate>,
    /// Meters; circle and isochrone geofences only.
    pub geometry_radius: Option<f64>,
}

impl Geofence {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Geofence", object);
        Ok(Self {
            id: r.id()?,
            description: r.opt_str("description"),
            tag: r.opt_str("tag"),
            external_id: r.opt_str("externalId"),
            metadata: r.opt_object("metadata"),
            geometry: r
                .opt_str("type")
                .map(|t| GeofenceGeometry::parse(&t))
                .unwrap_or(GeofenceGeometry::Unknown),
            geometry_center: r.point("geometryCenter")?,
            geometry_radius: r.opt_f64("geometryRadius"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    pub id: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub external_id: Option<String>,
    pub uuid: Option<String>,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub metadata: Option<JsonObject>,
    pub location: Option<Coordinate>,
}

impl Beacon {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Beacon", object);
        Ok(Self {
            id: r.opt_id(),
            description: r.opt_str("description"),
            tag: r.opt_str("tag"),
            external_id: r.opt_str("externalId"),
            uuid: r.opt_str("uuid"),
            major: r.opt_str("major"),
            minor: r.opt_str("minor"),
            metadata: r.opt_object("metadata"),
            location: r.point("geometry")?,
        })
    }
}

/// Fraud and location-verification signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fraud {
    pub passed: Option<bool>,
    pub bypassed: Option<bool>,
    pub verified: Option<bool>,
    pub proxy: Option<bool>,
    pub mocked: Option<bool>,
    pub compromised: Option<bool>,
    pub jumped: Option<bool>,
    pub inaccurate: Option<bool>,
    pub sharing: Option<bool>,
    pub blocked: Option<bool>,
}

impl Fraud {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Fraud", object);
        Ok(Self {
            passed: r.opt_bool("passed"),
            bypassed: r.opt_bool("bypassed"),
            verified: r.opt_bool("verified"),
            proxy: r.opt_bool("proxy"),
            mocked: r.opt_bool("mocked"),
            compromised: r.opt_bool("compromised"),
            jumped: r.opt_bool("jumped"),
            inaccurate: r.opt_bool("inaccurate"),
            sharing: r.opt_bool("sharing"),
            blocked: r.opt_bool("blocked"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<JsonObject>,
    pub location: Option<Location>,
    pub geofences: Option<Vec<Geofence>>,
    pub place: Option<Place>,
    pub beacons: Option<Vec<Beacon>>,
    pub stopped: Option<bool>,
    pub foreground: Option<bool>,
    pub country: Option<Region>,
    pub state: Option<Region>,
    pub dma: Option<Region>,
    pub postal_code: Option<Region>,
    pub trip: Option<Trip>,
    pub fraud: Option<Fraud>,
}

impl User {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("User", object);
        let location = r.point("location")?.map(|coordinate| {
            let mut location = Location::new(coordinate);
            location.accuracy = r.opt_f64("locationAccuracy").filter(|a| *a >= 0.0);
            location
        });
        Ok(Self {
            id: r.id()?,
            user_id: r.opt_str("userId"),
            device_id: r.opt_str("deviceId"),
            description: r.opt_str("description"),
            metadata: r.opt_object("metadata"),
            location,
            geofences: r.list("geofences", Geofence::from_json)?,
            place: r.entity("place", Place::from_json)?,
            beacons: r.list("beacons", Beacon::from_json)?,
            stopped: r.opt_bool("stopped"),
            foreground: r.opt_bool("foreground"),
            country: r.entity("country", Region::from_json)?,
            state: r.entity("state", Region::from_json)?,
            dma: r.entity("dma", Region::from_json)?,
            postal_code: r.entity("postalCode", Region::from_json)?,
            trip: r.entity("trip", Trip::from_json)?,
            fraud: r.entity("fraud", Fraud::from_json)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub actual_created_at: Option<DateTime<Utc>>,
    pub live: bool,
    pub replayed: Option<bool>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub confidence: EventConfidence,
    pub verification: EventVerification,
    pub geofence: Option<Geofence>,
    pub place: Option<Place>,
    pub alternate_places: Option<Vec<Place>>,
    pub verified_place: Option<Place>,
    pub region: Option<Region>,
    pub beacon: Option<Beacon>,
    pub trip: Option<Trip>,
    pub location: Option<Location>,
    /// Minutes spent in the geofence or place, for exit events.
    pub duration: Option<f64>,
}

impl Event {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Event", object);
        let location = r.point("location")?.map(|coordinate| {
            let mut location = Location::new(coordinate);
            location.accuracy = r.opt_f64("locationAccuracy").filter(|a| *a >= 0.0);
            location
        });
        Ok(Self {
            id: r.id()?,
            created_at: r.opt_timestamp("createdAt"),
            actual_created_at: r.opt_timestamp("actualCreatedAt"),
            live: r.opt_bool("live").unwrap_or(false),
            replayed: r.opt_bool("replayed"),
            event_type: r
                .opt_str("type")
                .map(|t| EventType::parse(&t))
                .unwrap_or(EventType::Unknown),
            confidence: EventConfidence::from_native(r.raw("confidence")),
            verification: EventVerification::from_native(r.raw("verification")),
            geofence: r.entity("geofence", Geofence::from_json)?,
            place: r.entity("place", Place::from_json)?,
            alternate_places: r.list("alternatePlaces", Place::from_json)?,
            verified_place: r.entity("verifiedPlace", Place::from_json)?,
            region: r.entity("region", Region::from_json)?,
            beacon: r.entity("beacon", Beacon::from_json)?,
            trip: r.entity("trip", Trip::from_json)?,
            location,
            duration: r.opt_f64("duration"),
        })
    }
}

/// Normalize a list of native event dictionaries.
pub fn events_from_native(events: &[JsonObject]) -> Result<Vec<Event>> {
    events.iter().map(Event::from_json).collect()
}

/// Normalize a list of native dictionaries with `parse`.
pub fn list_from_native<T>(
    items: &[JsonObject],
    parse: impl Fn(&JsonObject) -> Result<T>,
) -> Result<Vec<T>> {
    items.iter().map(parse).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub country_flag: Option<String>,
    pub dma: Option<String>,
    pub dma_code: Option<String>,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub borough: Option<String>,
    pub county: Option<String>,
    pub neighborhood: Option<String>,
    pub number: Option<String>,
    pub street: Option<String>,
    pub address_label: Option<String>,
    pub place_label: Option<String>,
    pub unit: Option<String>,
    pub plus4: Option<String>,
    pub layer: Option<String>,
    /// Meters from the search point, when the backend reports it.
    pub distance: Option<f64>,
    pub metadata: Option<JsonObject>,
    pub confidence: Option<AddressConfidence>,
}

impl Address {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Address", object);
        let latitude = r.opt_f64("latitude");
        let longitude = r.opt_f64("longitude");
        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            Coordinate::new(lat, lon)?;
        }
        Ok(Self {
            latitude,
            longitude,
            formatted_address: r.opt_str("formattedAddress"),
            country: r.opt_str("country"),
            country_code: r.opt_str("countryCode"),
            country_flag: r.opt_str("countryFlag"),
            dma: r.opt_str("dma"),
            dma_code: r.opt_str("dmaCode"),
            state: r.opt_str("state"),
            state_code: r.opt_str("stateCode"),
            postal_code: r.opt_str("postalCode"),
            city: r.opt_str("city"),
            borough: r.opt_str("borough"),
            county: r.opt_str("county"),
            neighborhood: r.opt_str("neighborhood"),
            number: r.opt_str("number"),
            street: r.opt_str("street"),
            address_label: r.opt_str("addressLabel"),
            place_label: r.opt_str("placeLabel"),
            unit: r.opt_str("unit"),
            plus4: r.opt_str("plus4"),
            layer: r.opt_str("layer"),
            distance: r.opt_f64("distance"),
            metadata: r.opt_object("metadata"),
            confidence: r.opt_str("confidence").map(|c| AddressConfidence::parse(&c)),
        })
    }

    /// Native dictionary for address validation; absent fields are omitted.
    pub fn to_native(&self) -> JsonObject {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut object)) => {
                object.retain(|_, v| !v.is_null());
                object
            }
            _ => JsonObject::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDistance {
    /// Feet or meters, depending on the requested units.
    pub value: Option<f64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDuration {
    /// Minutes.
    pub value: Option<f64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub distance: Option<RouteDistance>,
    pub duration: Option<RouteDuration>,
}

impl Route {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Route", object);
        Ok(Self {
            distance: r.entity("distance", |d| {
                let d = ObjectReader::new("RouteDistance", d);
                Ok(RouteDistance {
                    value: d.opt_f64("value"),
                    text: d.opt_str("text"),
                })
            })?,
            duration: r.entity("duration", |d| {
                let d = ObjectReader::new("RouteDuration", d);
                Ok(RouteDuration {
                    value: d.opt_f64("value"),
                    text: d.opt_str("text"),
                })
            })?,
        })
    }
}

/// Routes per travel mode; only the requested modes are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routes {
    pub geodesic: Option<Route>,
    pub foot: Option<Route>,
    pub bike: Option<Route>,
    pub car: Option<Route>,
    pub truck: Option<Route>,
    pub motorbike: Option<Route>,
}

impl Routes {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Routes", object);
        Ok(Self {
            geodesic: r.entity("geodesic", Route::from_json)?,
            foot: r.entity("foot", Route::from_json)?,
            bike: r.entity("bike", Route::from_json)?,
            car: r.entity("car", Route::from_json)?,
            truck: r.entity("truck", Route::from_json)?,
            motorbike: r.entity("motorbike", Route::from_json)?,
        })
    }
}

/// Routes between every origin (row) and destination (column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatrix {
    pub rows: Vec<Vec<Route>>,
}

impl RouteMatrix {
    pub fn from_native(rows: &[Vec<JsonObject>]) -> Result<Self> {
        let rows = rows
            .iter()
            .map(|row| list_from_native(row, Route::from_json))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn route(&self, origin: usize, destination: usize) -> Option<&Route> {
        self.rows.get(origin).and_then(|row| row.get(destination))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedLocationToken {
    pub user: Option<User>,
    pub events: Option<Vec<Event>>,
    /// Signed JWT.
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds.
    pub expires_in: Option<f64>,
    pub passed: Option<bool>,
}

impl VerifiedLocationToken {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("VerifiedLocationToken", object);
        Ok(Self {
            user: r.entity("user", User::from_json)?,
            events: r.list("events", Event::from_json)?,
            token: r.opt_str("token"),
            expires_at: r.opt_timestamp("expiresAt"),
            expires_in: r.opt_f64("expiresIn"),
            passed: r.opt_bool("passed"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub geofences: Option<Vec<Geofence>>,
    pub place: Option<Place>,
    pub country: Option<Region>,
    pub state: Option<Region>,
    pub dma: Option<Region>,
    pub postal_code: Option<Region>,
}

impl Context {
    pub fn from_json(object: &JsonObject) -> Result<Self> {
        let r = ObjectReader::new("Context", object);
        Ok(Self {
            geofences: r.list("geofences", Geofence::from_json)?,
            place: r.entity("place", Place::from_json)?,
            country: r.entity("country", Region::from_json)?,
            state: r.entity("state", Region::from_json)?,
            dma: r.entity("dma", Region::from_json)?,
            postal_code: r.entity("postalCode", Region::from_json)?,
        })
    }
}
