//! # Core Schema
//!
//! The canonical, serializable data model exposed to host applications and
//! the converters between it and the native SDK's value shapes.
//!
//! ## Overview
//!
//! - [`location`] - coordinate validation and sentinel-free locations
//! - [`tracking`] - tracking options with fail-closed enum fields
//! - [`trip`] - trip options, trip records and the status lattice
//! - [`entities`] - users, events, geofences, places, regions, addresses,
//!   routes and verification tokens
//! - [`status`] - the canonical status taxonomy
//!
//! Conversion is pure: nothing here performs I/O or holds state. Enum
//! matching is case-insensitive and separator-insensitive, and each enum
//! declares whether unknown values fall back to a safe variant or are
//! rejected.

pub mod entities;
mod enums;
pub mod error;
pub mod location;
mod reader;
pub mod status;
pub mod tracking;
pub mod trip;

pub use entities::{
    events_from_native, list_from_native, Address, AddressConfidence, AddressVerificationStatus,
    Beacon, Chain, Context, Event, EventConfidence, EventType, EventVerification, Fraud, Geofence,
    GeofenceGeometry, Place, Region, Route, RouteMatrix, Routes, User, VerifiedLocationToken,
};
pub use enums::normalize_token;
pub use error::{Result, SchemaError};
pub use location::{Coordinate, Location};
pub use status::{LocationSource, PermissionsStatus, SdkLogLevel, Status};
pub use tracking::{
    DesiredAccuracy, ForegroundServiceOptions, ReplayPolicy, SyncPolicy, TrackingOptions,
};
pub use trip::{RouteMode, RouteUnits, Trip, TripEta, TripOptions, TripStatus};
