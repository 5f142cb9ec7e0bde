//! Native SDK Contract
//!
//! The location SDK is stateful and callback-driven: commands take a
//! completion handler that fires on an SDK-owned thread, and push-style
//! notifications go to a single registered delegate. [`LocationSdk`] mirrors
//! that surface one-to-one, including the separate "device location" and
//! "fixed location" overloads, so the bridge decides which overload to call
//! instead of the adapter guessing.
//!
//! # Platform Support
//!
//! - **iOS**: wraps the SDK class methods and its delegate protocol
//! - **Android**: wraps the SDK singleton and its broadcast receiver
//! - **Web**: partial; unsupported commands are reported via [`LocationSdk::supports`]
//! - **Tests/desktop**: `bridge-sim` provides an in-memory implementation
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::sdk::{LocationSdk, Completion};
//! use bridge_traits::native::LocationReply;
//!
//! fn locate(sdk: &dyn LocationSdk) {
//!     let done: Completion<LocationReply> = Box::new(|reply| {
//!         println!("status {}", reply.status);
//!     });
//!     sdk.get_location(bridge_traits::native::NativeDesiredAccuracy::Medium, done);
//! }
//! ```

use std::sync::Arc;

use crate::native::{
    AutocompleteQuery, ContextReply, ConversionReply, ConversionRequest, GeocodeQuery,
    GeocodeReply, GeofenceSearch, IpGeocodeReply, JsonObject, LocationReply, MatrixQuery,
    MatrixReply, MockTrackingRequest, NativeAuthorization, NativeDesiredAccuracy,
    NativeForegroundServiceOptions, NativeLocation, NativeLocationSource, NativeLogLevel,
    NativeStatus, NativeTrackingOptions, NativeTripOptions, NativeTripStatus, PlaceSearch,
    RouteQuery, RouteReply, SearchGeofencesReply, SearchPlacesReply, TokenReply, TrackReply,
    TripReply, ValidateAddressReply,
};
use crate::operation::Operation;
use crate::platform::PlatformSendSync;

/// One-shot completion handler passed to an asynchronous SDK command.
///
/// Being `FnOnce`, a handler can fire at most once.
#[cfg(not(target_arch = "wasm32"))]
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

#[cfg(target_arch = "wasm32")]
pub type Completion<T> = Box<dyn FnOnce(T) + 'static>;

/// Delegate receiving the SDK's push notifications.
///
/// The SDK holds exactly one receiver. Callbacks may arrive on any thread.
pub trait NativeReceiver: PlatformSendSync {
    fn on_events_received(&self, events: Vec<JsonObject>, user: Option<JsonObject>);

    fn on_location_updated(&self, location: NativeLocation, user: JsonObject);

    fn on_client_location_updated(
        &self,
        location: NativeLocation,
        stopped: bool,
        source: NativeLocationSource,
    );

    fn on_error(&self, status: NativeStatus);

    fn on_log(&self, message: String);

    fn on_token_updated(&self, token: JsonObject);
}

/// Command surface of the native location SDK.
///
/// Synchronous methods return immediately; methods taking a [`Completion`]
/// report their outcome through it exactly once (or never, if the SDK loses
/// the request).
pub trait LocationSdk: PlatformSendSync {
    /// Whether this platform implements `operation`.
    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    /// Replace the SDK's delegate.
    fn set_receiver(&self, receiver: Arc<dyn NativeReceiver>);

    // -- Identity -----------------------------------------------------------

    fn initialize(&self, publishable_key: &str);

    fn set_log_level(&self, level: NativeLogLevel);

    fn set_user_id(&self, user_id: Option<String>);

    fn user_id(&self) -> Option<String>;

    fn set_description(&self, description: Option<String>);

    fn description(&self) -> Option<String>;

    fn set_metadata(&self, metadata: Option<JsonObject>);

    fn metadata(&self) -> Option<JsonObject>;

    fn set_anonymous_tracking_enabled(&self, enabled: bool);

    // -- Permissions --------------------------------------------------------

    fn authorization_status(&self) -> NativeAuthorization;

    fn request_permissions(&self, background: bool);

    // -- Location & tracking ------------------------------------------------

    fn get_location(&self, accuracy: NativeDesiredAccuracy, done: Completion<LocationReply>);

    /// Track once using the device's current location.
    fn track_once(&self, accuracy: NativeDesiredAccuracy, beacons: bool, done: Completion<TrackReply>);

    /// Track once with a caller-supplied location.
    fn track_once_at(&self, location: NativeLocation, done: Completion<TrackReply>);

    fn track_verified(&self, beacons: bool, done: Completion<TokenReply>);

    fn get_verified_location_token(&self, done: Completion<TokenReply>);

    fn start_tracking_verified(&self, interval_secs: i32, beacons: bool);

    fn stop_tracking_verified(&self);

    fn start_tracking(&self, options: NativeTrackingOptions);

    fn mock_tracking(&self, request: MockTrackingRequest, done: Completion<TrackReply>);

    fn stop_tracking(&self);

    fn is_tracking(&self) -> bool;

    fn tracking_options(&self) -> NativeTrackingOptions;

    fn set_foreground_service_options(&self, options: NativeForegroundServiceOptions);

    // -- Trips --------------------------------------------------------------

    fn start_trip(
        &self,
        options: NativeTripOptions,
        tracking: Option<NativeTrackingOptions>,
        done: Completion<TripReply>,
    );

    fn update_trip(
        &self,
        options: NativeTripOptions,
        status: NativeTripStatus,
        done: Completion<TripReply>,
    );

    fn complete_trip(&self, done: Completion<TripReply>);

    fn cancel_trip(&self, done: Completion<TripReply>);

    // -- Event verification -------------------------------------------------

    fn accept_event(&self, event_id: String, verified_place_id: Option<String>);

    fn reject_event(&self, event_id: String);

    // -- Backend pass-through -----------------------------------------------

    fn get_context(&self, done: Completion<ContextReply>);

    fn get_context_at(&self, location: NativeLocation, done: Completion<ContextReply>);

    /// Search relative to the device's current location.
    fn search_places(&self, search: PlaceSearch, done: Completion<SearchPlacesReply>);

    fn search_places_near(
        &self,
        near: NativeLocation,
        search: PlaceSearch,
        done: Completion<SearchPlacesReply>,
    );

    fn search_geofences(&self, search: GeofenceSearch, done: Completion<SearchGeofencesReply>);

    fn search_geofences_near(
        &self,
        near: NativeLocation,
        search: GeofenceSearch,
        done: Completion<SearchGeofencesReply>,
    );

    fn autocomplete(&self, query: AutocompleteQuery, done: Completion<GeocodeReply>);

    fn geocode(&self, query: GeocodeQuery, done: Completion<GeocodeReply>);

    fn reverse_geocode(&self, layers: Option<Vec<String>>, done: Completion<GeocodeReply>);

    fn reverse_geocode_at(
        &self,
        location: NativeLocation,
        layers: Option<Vec<String>>,
        done: Completion<GeocodeReply>,
    );

    fn ip_geocode(&self, done: Completion<IpGeocodeReply>);

    /// Routes from the device's current location.
    fn get_distance(
        &self,
        destination: NativeLocation,
        query: RouteQuery,
        done: Completion<RouteReply>,
    );

    fn get_distance_from(
        &self,
        origin: NativeLocation,
        destination: NativeLocation,
        query: RouteQuery,
        done: Completion<RouteReply>,
    );

    fn get_matrix(&self, query: MatrixQuery, done: Completion<MatrixReply>);

    fn validate_address(&self, address: JsonObject, done: Completion<ValidateAddressReply>);

    fn log_conversion(&self, request: ConversionRequest, done: Completion<ConversionReply>);
}
