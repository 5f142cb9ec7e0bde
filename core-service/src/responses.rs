//! Result payloads resolved to the host, one per command shape. Every
//! payload that reflects a native round trip carries the canonical `status`.

use bridge_traits::JsonObject;
use core_schema::{
    Address, AddressVerificationStatus, Context, Event, Geofence, Location, PermissionsStatus,
    Place, RouteMatrix, Routes, Status, Trip, TripOptions, User, VerifiedLocationToken,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdResponse {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionResponse {
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataResponse {
    pub metadata: Option<JsonObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionsResponse {
    pub status: PermissionsStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationResponse {
    pub status: Status,
    pub location: Location,
    pub stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResponse {
    pub status: Status,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResponse {
    pub status: Status,
    pub token: VerifiedLocationToken,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsTrackingResponse {
    #[serde(rename = "isTracking")]
    pub is_tracking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<Trip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripOptionsResponse {
    pub options: Option<TripOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub context: Context,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacesResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofencesResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub geofences: Vec<Geofence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressesResponse {
    pub status: Status,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpGeocodeResponse {
    pub status: Status,
    pub address: Address,
    pub proxy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceResponse {
    pub status: Status,
    pub routes: Routes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixResponse {
    pub status: Status,
    pub matrix: RouteMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateAddressResponse {
    pub status: Status,
    pub address: Address,
    #[serde(rename = "verificationStatus")]
    pub verification_status: AddressVerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResponse {
    pub status: Status,
    pub event: Event,
}
