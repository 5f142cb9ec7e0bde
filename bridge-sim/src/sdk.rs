use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use bridge_traits::native::{
    AutocompleteQuery, ContextReply, ConversionReply, ConversionRequest, GeocodeQuery,
    GeocodeReply, GeofenceSearch, IpGeocodeReply, JsonObject, LocationReply, MatrixQuery,
    MatrixReply, MockTrackingRequest, NativeAuthorization, NativeDesiredAccuracy,
    NativeForegroundServiceOptions, NativeLocation, NativeLocationSource, NativeLogLevel,
    NativeStatus, NativeTrackingOptions, NativeTripOptions, NativeTripStatus, PlaceSearch,
    RouteQuery, RouteReply, SearchGeofencesReply, SearchPlacesReply, TokenReply, TrackReply,
    TripReply, ValidateAddressReply,
};
use bridge_traits::sdk::{Completion, LocationSdk, NativeReceiver};
use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::Operation;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::fixtures::{self, UserFixture};

/// How completions are delivered back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Invoke the completion before the SDK method returns.
    #[default]
    Inline,
    /// Invoke the completion from a freshly spawned thread, the way platform
    /// SDKs answer from their own queues.
    Threaded,
}

/// One recorded native invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SdkCall {
    /// SDK method name, distinguishing overloads (`searchPlaces` vs
    /// `searchPlacesNear`).
    pub operation: &'static str,
    pub args: Value,
}

struct SimState {
    calls: Vec<SdkCall>,
    statuses: HashMap<&'static str, NativeStatus>,
    dropped: HashSet<&'static str>,
    unsupported: HashSet<Operation>,
    mode: CompletionMode,

    publishable_key: Option<String>,
    log_level: NativeLogLevel,
    user_id: Option<String>,
    description: Option<String>,
    metadata: Option<JsonObject>,
    anonymous: bool,
    authorization: NativeAuthorization,

    location: NativeLocation,
    stopped: bool,
    tracking: bool,
    verified_tracking: bool,
    tracking_options: NativeTrackingOptions,
    foreground_service: NativeForegroundServiceOptions,

    trip: Option<(String, NativeTripOptions, NativeTripStatus)>,
    trip_events: Option<Vec<JsonObject>>,
    places: Vec<JsonObject>,
    geofences: Vec<JsonObject>,
    addresses: Vec<JsonObject>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            statuses: HashMap::new(),
            dropped: HashSet::new(),
            unsupported: HashSet::new(),
            mode: CompletionMode::Inline,
            publishable_key: None,
            log_level: NativeLogLevel::Info,
            user_id: None,
            description: None,
            metadata: None,
            anonymous: false,
            authorization: NativeAuthorization::NotDetermined,
            location: NativeLocation::at(40.783_826, -73.975_363).with_horizontal_accuracy(65.0),
            stopped: true,
            tracking: false,
            verified_tracking: false,
            tracking_options: NativeTrackingOptions::efficient(),
            foreground_service: NativeForegroundServiceOptions::default(),
            trip: None,
            trip_events: None,
            places: Vec::new(),
            geofences: Vec::new(),
            addresses: vec![fixtures::default_address()],
        }
    }
}

/// In-memory [`LocationSdk`] that records every call.
///
/// Every command succeeds unless a status is scripted for its method name
/// with [`script_status`](Self::script_status). Non-success replies carry no
/// data, like the platform SDKs.
pub struct SimulatedSdk {
    state: Mutex<SimState>,
    receiver: Mutex<Option<Arc<dyn NativeReceiver>>>,
    receiver_registrations: AtomicUsize,
    clock: Arc<dyn Clock>,
    install_id: String,
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSdk {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            receiver: Mutex::new(None),
            receiver_registrations: AtomicUsize::new(0),
            clock,
            install_id: Uuid::new_v4().to_string(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Scripting ----------------------------------------------------------

    /// Reply to `operation` with `status` from now on.
    pub fn script_status(&self, operation: &'static str, status: impl Into<NativeStatus>) {
        self.state().statuses.insert(operation, status.into());
    }

    pub fn clear_script(&self, operation: &'static str) {
        let mut state = self.state();
        state.statuses.remove(operation);
        state.dropped.remove(operation);
    }

    /// Drop the completion for `operation` without ever invoking it.
    pub fn drop_completions(&self, operation: &'static str) {
        self.state().dropped.insert(operation);
    }

    pub fn set_completion_mode(&self, mode: CompletionMode) {
        self.state().mode = mode;
    }

    pub fn mark_unsupported(&self, operation: Operation) {
        self.state().unsupported.insert(operation);
    }

    pub fn set_authorization(&self, authorization: NativeAuthorization) {
        self.state().authorization = authorization;
    }

    pub fn set_device_location(&self, location: NativeLocation) {
        self.state().location = location;
    }

    /// Events attached to every trip reply, replacing the default empty list.
    pub fn set_trip_events(&self, events: Option<Vec<JsonObject>>) {
        self.state().trip_events = events;
    }

    pub fn set_places(&self, places: Vec<JsonObject>) {
        self.state().places = places;
    }

    pub fn set_geofences(&self, geofences: Vec<JsonObject>) {
        self.state().geofences = geofences;
    }

    pub fn set_addresses(&self, addresses: Vec<JsonObject>) {
        self.state().addresses = addresses;
    }

    // -- Inspection ---------------------------------------------------------

    pub fn calls(&self) -> Vec<SdkCall> {
        self.state().calls.clone()
    }

    pub fn calls_named(&self, operation: &str) -> Vec<SdkCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn receiver_registrations(&self) -> usize {
        self.receiver_registrations.load(Ordering::SeqCst)
    }

    pub fn publishable_key(&self) -> Option<String> {
        self.state().publishable_key.clone()
    }

    pub fn log_level(&self) -> NativeLogLevel {
        self.state().log_level
    }

    pub fn anonymous_tracking(&self) -> bool {
        self.state().anonymous
    }

    pub fn is_tracking_verified(&self) -> bool {
        self.state().verified_tracking
    }

    pub fn foreground_service_options(&self) -> NativeForegroundServiceOptions {
        self.state().foreground_service.clone()
    }

    /// External id and status of the trip the simulated SDK considers active.
    pub fn active_trip(&self) -> Option<(String, NativeTripStatus)> {
        self.state()
            .trip
            .as_ref()
            .map(|(_, options, status)| (options.external_id.clone(), *status))
    }

    // -- Delegate emission ----------------------------------------------------

    fn receiver(&self) -> Option<Arc<dyn NativeReceiver>> {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn emit_events(&self, events: Vec<JsonObject>, user: Option<JsonObject>) {
        if let Some(receiver) = self.receiver() {
            receiver.on_events_received(events, user);
        }
    }

    pub fn emit_location(&self, location: NativeLocation, user: JsonObject) {
        if let Some(receiver) = self.receiver() {
            receiver.on_location_updated(location, user);
        }
    }

    pub fn emit_client_location(
        &self,
        location: NativeLocation,
        stopped: bool,
        source: NativeLocationSource,
    ) {
        if let Some(receiver) = self.receiver() {
            receiver.on_client_location_updated(location, stopped, source);
        }
    }

    pub fn emit_error(&self, status: impl Into<NativeStatus>) {
        if let Some(receiver) = self.receiver() {
            receiver.on_error(status.into());
        }
    }

    pub fn emit_log(&self, message: impl Into<String>) {
        if let Some(receiver) = self.receiver() {
            receiver.on_log(message.into());
        }
    }

    pub fn emit_token(&self, token: JsonObject) {
        if let Some(receiver) = self.receiver() {
            receiver.on_token_updated(token);
        }
    }

    /// Current user dictionary as the backend would return it.
    pub fn user_json(&self) -> JsonObject {
        let state = self.state();
        self.user_from(&state)
    }

    // -- Internals ----------------------------------------------------------

    fn user_from(&self, state: &SimState) -> JsonObject {
        let trip = state
            .trip
            .as_ref()
            .map(|(id, options, status)| fixtures::trip(id, options, *status));
        fixtures::user(UserFixture {
            id: &self.install_id,
            user_id: state.user_id.as_deref(),
            description: state.description.as_deref(),
            metadata: state.metadata.as_ref(),
            location: &state.location,
            stopped: state.stopped,
            trip,
        })
    }

    fn record(&self, operation: &'static str, args: Value) {
        debug!(operation, "Simulated SDK call");
        self.state().calls.push(SdkCall { operation, args });
    }

    /// Scripted status for `operation`, or `None` when it succeeds.
    fn failure(&self, operation: &'static str) -> Option<NativeStatus> {
        self.state()
            .statuses
            .get(operation)
            .filter(|status| **status != NativeStatus::success())
            .cloned()
    }

    fn stamped_location(&self, state: &SimState) -> NativeLocation {
        state.location.clone().with_timestamp(self.clock.now())
    }

    fn complete<T: Send + 'static>(&self, operation: &'static str, done: Completion<T>, reply: T) {
        let (dropped, mode) = {
            let state = self.state();
            (state.dropped.contains(operation), state.mode)
        };
        if dropped {
            debug!(operation, "Dropping completion");
            return;
        }
        match mode {
            CompletionMode::Inline => done(reply),
            CompletionMode::Threaded => {
                thread::spawn(move || done(reply));
            }
        }
    }

    fn trip_reply(&self, operation: &'static str, next: Option<NativeTripStatus>) -> TripReply {
        if let Some(status) = self.failure(operation) {
            return TripReply {
                status,
                trip: None,
                events: None,
            };
        }
        let now = self.clock.now();
        let mut state = self.state();
        let trip = state.trip.as_mut().map(|(id, options, status)| {
            if let Some(next) = next.filter(|n| *n != NativeTripStatus::Unknown) {
                *status = next;
            }
            fixtures::trip(id, options, *status)
        });
        let events = match &state.trip_events {
            Some(events) => events.clone(),
            None => vec![fixtures::event(
                &Uuid::new_v4().to_string(),
                "user.updated_trip",
                now,
            )],
        };
        if next.map_or(false, |n| {
            matches!(
                n,
                NativeTripStatus::Completed | NativeTripStatus::Canceled | NativeTripStatus::Expired
            )
        }) {
            state.trip = None;
        }
        TripReply {
            status: NativeStatus::success(),
            trip,
            events: Some(events),
        }
    }
}

fn to_args<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

impl LocationSdk for SimulatedSdk {
    fn supports(&self, operation: Operation) -> bool {
        !self.state().unsupported.contains(&operation)
    }

    fn set_receiver(&self, receiver: Arc<dyn NativeReceiver>) {
        self.receiver_registrations.fetch_add(1, Ordering::SeqCst);
        *self.receiver.lock().unwrap_or_else(PoisonError::into_inner) = Some(receiver);
    }

    fn initialize(&self, publishable_key: &str) {
        self.record("initialize", json!({"publishableKey": publishable_key}));
        self.state().publishable_key = Some(publishable_key.to_string());
    }

    fn set_log_level(&self, level: NativeLogLevel) {
        self.record("setLogLevel", json!({"level": to_args(&level)}));
        self.state().log_level = level;
    }

    fn set_user_id(&self, user_id: Option<String>) {
        self.record("setUserId", json!({"userId": user_id}));
        self.state().user_id = user_id;
    }

    fn user_id(&self) -> Option<String> {
        self.record("getUserId", Value::Null);
        self.state().user_id.clone()
    }

    fn set_description(&self, description: Option<String>) {
        self.record("setDescription", json!({"description": description}));
        self.state().description = description;
    }

    fn description(&self) -> Option<String> {
        self.record("getDescription", Value::Null);
        self.state().description.clone()
    }

    fn set_metadata(&self, metadata: Option<JsonObject>) {
        self.record("setMetadata", json!({"metadata": metadata}));
        self.state().metadata = metadata;
    }

    fn metadata(&self) -> Option<JsonObject> {
        self.record("getMetadata", Value::Null);
        self.state().metadata.clone()
    }

    fn set_anonymous_tracking_enabled(&self, enabled: bool) {
        self.record("setAnonymousTrackingEnabled", json!({"enabled": enabled}));
        self.state().anonymous = enabled;
    }

    fn authorization_status(&self) -> NativeAuthorization {
        self.record("getLocationPermissionsStatus", Value::Null);
        self.state().authorization
    }

    fn request_permissions(&self, background: bool) {
        self.record("requestLocationPermissions", json!({"background": background}));
        self.state().authorization = if background {
            NativeAuthorization::AuthorizedAlways
        } else {
            NativeAuthorization::AuthorizedWhenInUse
        };
    }

    fn get_location(&self, accuracy: NativeDesiredAccuracy, done: Completion<LocationReply>) {
        self.record("getLocation", json!({"desiredAccuracy": to_args(&accuracy)}));
        let reply = match self.failure("getLocation") {
            Some(status) => LocationReply {
                status,
                location: None,
                stopped: false,
            },
            None => {
                let state = self.state();
                LocationReply {
                    status: NativeStatus::success(),
                    location: Some(self.stamped_location(&state)),
                    stopped: state.stopped,
                }
            }
        };
        self.complete("getLocation", done, reply);
    }

    fn track_once(
        &self,
        accuracy: NativeDesiredAccuracy,
        beacons: bool,
        done: Completion<TrackReply>,
    ) {
        self.record(
            "trackOnce",
            json!({"desiredAccuracy": to_args(&accuracy), "beacons": beacons}),
        );
        let reply = match self.failure("trackOnce") {
            Some(status) => TrackReply {
                status,
                location: None,
                events: None,
                user: None,
            },
            None => {
                let state = self.state();
                TrackReply {
                    status: NativeStatus::success(),
                    location: Some(self.stamped_location(&state)),
                    events: Some(vec![]),
                    user: Some(self.user_from(&state)),
                }
            }
        };
        self.complete("trackOnce", done, reply);
    }

    fn track_once_at(&self, location: NativeLocation, done: Completion<TrackReply>) {
        self.record("trackOnceAt", json!({"location": to_args(&location)}));
        let reply = match self.failure("trackOnceAt") {
            Some(status) => TrackReply {
                status,
                location: None,
                events: None,
                user: None,
            },
            None => {
                let mut state = self.state();
                state.location = location.clone();
                TrackReply {
                    status: NativeStatus::success(),
                    location: Some(location),
                    events: Some(vec![]),
                    user: Some(self.user_from(&state)),
                }
            }
        };
        self.complete("trackOnceAt", done, reply);
    }

    fn track_verified(&self, beacons: bool, done: Completion<TokenReply>) {
        self.record("trackVerified", json!({"beacons": beacons}));
        let reply = match self.failure("trackVerified") {
            Some(status) => TokenReply {
                status,
                token: None,
            },
            None => TokenReply {
                status: NativeStatus::success(),
                token: Some(fixtures::token(
                    self.user_json(),
                    self.clock.now(),
                    &Uuid::new_v4().to_string(),
                )),
            },
        };
        self.complete("trackVerified", done, reply);
    }

    fn get_verified_location_token(&self, done: Completion<TokenReply>) {
        self.record("getVerifiedLocationToken", Value::Null);
        let reply = match self.failure("getVerifiedLocationToken") {
            Some(status) => TokenReply {
                status,
                token: None,
            },
            None => TokenReply {
                status: NativeStatus::success(),
                token: Some(fixtures::token(
                    self.user_json(),
                    self.clock.now(),
                    &Uuid::new_v4().to_string(),
                )),
            },
        };
        self.complete("getVerifiedLocationToken", done, reply);
    }

    fn start_tracking_verified(&self, interval_secs: i32, beacons: bool) {
        self.record(
            "startTrackingVerified",
            json!({"interval": interval_secs, "beacons": beacons}),
        );
        self.state().verified_tracking = true;
    }

    fn stop_tracking_verified(&self) {
        self.record("stopTrackingVerified", Value::Null);
        self.state().verified_tracking = false;
    }

    fn start_tracking(&self, options: NativeTrackingOptions) {
        self.record("startTracking", json!({"options": to_args(&options)}));
        let mut state = self.state();
        state.tracking = true;
        state.tracking_options = options;
    }

    fn mock_tracking(&self, request: MockTrackingRequest, done: Completion<TrackReply>) {
        self.record("mockTracking", to_args(&request));
        let reply = match self.failure("mockTracking") {
            Some(status) => TrackReply {
                status,
                location: None,
                events: None,
                user: None,
            },
            None => {
                let mut state = self.state();
                let mut destination = request.destination.clone();
                destination.mocked = true;
                state.location = destination.clone();
                TrackReply {
                    status: NativeStatus::success(),
                    location: Some(destination),
                    events: Some(vec![]),
                    user: Some(self.user_from(&state)),
                }
            }
        };
        self.complete("mockTracking", done, reply);
    }

    fn stop_tracking(&self) {
        self.record("stopTracking", Value::Null);
        self.state().tracking = false;
    }

    fn is_tracking(&self) -> bool {
        self.record("isTracking", Value::Null);
        self.state().tracking
    }

    fn tracking_options(&self) -> NativeTrackingOptions {
        self.record("getTrackingOptions", Value::Null);
        self.state().tracking_options.clone()
    }

    fn set_foreground_service_options(&self, options: NativeForegroundServiceOptions) {
        self.record("setForegroundServiceOptions", to_args(&options));
        self.state().foreground_service = options;
    }

    fn start_trip(
        &self,
        options: NativeTripOptions,
        tracking: Option<NativeTrackingOptions>,
        done: Completion<TripReply>,
    ) {
        self.record(
            "startTrip",
            json!({"options": to_args(&options), "trackingOptions": tracking.as_ref().map(to_args)}),
        );
        if self.failure("startTrip").is_none() {
            let mut state = self.state();
            state.trip = Some((Uuid::new_v4().to_string(), options, NativeTripStatus::Started));
            if let Some(tracking) = tracking {
                state.tracking = true;
                state.tracking_options = tracking;
            }
        }
        let reply = self.trip_reply("startTrip", None);
        self.complete("startTrip", done, reply);
    }

    fn update_trip(
        &self,
        options: NativeTripOptions,
        status: NativeTripStatus,
        done: Completion<TripReply>,
    ) {
        self.record(
            "updateTrip",
            json!({"options": to_args(&options), "status": to_args(&status)}),
        );
        if self.failure("updateTrip").is_none() {
            if let Some((_, current, _)) = self.state().trip.as_mut() {
                *current = options;
            }
        }
        let reply = self.trip_reply("updateTrip", Some(status));
        self.complete("updateTrip", done, reply);
    }

    fn complete_trip(&self, done: Completion<TripReply>) {
        self.record("completeTrip", Value::Null);
        let reply = self.trip_reply("completeTrip", Some(NativeTripStatus::Completed));
        self.complete("completeTrip", done, reply);
    }

    fn cancel_trip(&self, done: Completion<TripReply>) {
        self.record("cancelTrip", Value::Null);
        let reply = self.trip_reply("cancelTrip", Some(NativeTripStatus::Canceled));
        self.complete("cancelTrip", done, reply);
    }

    fn accept_event(&self, event_id: String, verified_place_id: Option<String>) {
        self.record(
            "acceptEvent",
            json!({"eventId": event_id, "verifiedPlaceId": verified_place_id}),
        );
    }

    fn reject_event(&self, event_id: String) {
        self.record("rejectEvent", json!({"eventId": event_id}));
    }

    fn get_context(&self, done: Completion<ContextReply>) {
        self.record("getContext", Value::Null);
        let location = self.stamped_location(&self.state());
        let reply = self.context_reply("getContext", location);
        self.complete("getContext", done, reply);
    }

    fn get_context_at(&self, location: NativeLocation, done: Completion<ContextReply>) {
        self.record("getContextAt", json!({"location": to_args(&location)}));
        let reply = self.context_reply("getContextAt", location);
        self.complete("getContextAt", done, reply);
    }

    fn search_places(&self, search: PlaceSearch, done: Completion<SearchPlacesReply>) {
        self.record("searchPlaces", to_args(&search));
        let location = self.stamped_location(&self.state());
        let reply = self.places_reply("searchPlaces", location);
        self.complete("searchPlaces", done, reply);
    }

    fn search_places_near(
        &self,
        near: NativeLocation,
        search: PlaceSearch,
        done: Completion<SearchPlacesReply>,
    ) {
        self.record(
            "searchPlacesNear",
            json!({"near": to_args(&near), "search": to_args(&search)}),
        );
        let reply = self.places_reply("searchPlacesNear", near);
        self.complete("searchPlacesNear", done, reply);
    }

    fn search_geofences(&self, search: GeofenceSearch, done: Completion<SearchGeofencesReply>) {
        self.record("searchGeofences", to_args(&search));
        let location = self.stamped_location(&self.state());
        let reply = self.geofences_reply("searchGeofences", location);
        self.complete("searchGeofences", done, reply);
    }

    fn search_geofences_near(
        &self,
        near: NativeLocation,
        search: GeofenceSearch,
        done: Completion<SearchGeofencesReply>,
    ) {
        self.record(
            "searchGeofencesNear",
            json!({"near": to_args(&near), "search": to_args(&search)}),
        );
        let reply = self.geofences_reply("searchGeofencesNear", near);
        self.complete("searchGeofencesNear", done, reply);
    }

    fn autocomplete(&self, query: AutocompleteQuery, done: Completion<GeocodeReply>) {
        self.record("autocomplete", to_args(&query));
        let reply = self.geocode_reply("autocomplete");
        self.complete("autocomplete", done, reply);
    }

    fn geocode(&self, query: GeocodeQuery, done: Completion<GeocodeReply>) {
        self.record("geocode", to_args(&query));
        let reply = self.geocode_reply("geocode");
        self.complete("geocode", done, reply);
    }

    fn reverse_geocode(&self, layers: Option<Vec<String>>, done: Completion<GeocodeReply>) {
        self.record("reverseGeocode", json!({"layers": layers}));
        let reply = self.geocode_reply("reverseGeocode");
        self.complete("reverseGeocode", done, reply);
    }

    fn reverse_geocode_at(
        &self,
        location: NativeLocation,
        layers: Option<Vec<String>>,
        done: Completion<GeocodeReply>,
    ) {
        self.record(
            "reverseGeocodeAt",
            json!({"location": to_args(&location), "layers": layers}),
        );
        let reply = self.geocode_reply("reverseGeocodeAt");
        self.complete("reverseGeocodeAt", done, reply);
    }

    fn ip_geocode(&self, done: Completion<IpGeocodeReply>) {
        self.record("ipGeocode", Value::Null);
        let reply = match self.failure("ipGeocode") {
            Some(status) => IpGeocodeReply {
                status,
                address: None,
                proxy: false,
            },
            None => IpGeocodeReply {
                status: NativeStatus::success(),
                address: self.state().addresses.first().cloned(),
                proxy: false,
            },
        };
        self.complete("ipGeocode", done, reply);
    }

    fn get_distance(
        &self,
        destination: NativeLocation,
        query: RouteQuery,
        done: Completion<RouteReply>,
    ) {
        self.record(
            "getDistance",
            json!({"destination": to_args(&destination), "query": to_args(&query)}),
        );
        let reply = self.route_reply("getDistance", &query);
        self.complete("getDistance", done, reply);
    }

    fn get_distance_from(
        &self,
        origin: NativeLocation,
        destination: NativeLocation,
        query: RouteQuery,
        done: Completion<RouteReply>,
    ) {
        self.record(
            "getDistanceFrom",
            json!({
                "origin": to_args(&origin),
                "destination": to_args(&destination),
                "query": to_args(&query),
            }),
        );
        let reply = self.route_reply("getDistanceFrom", &query);
        self.complete("getDistanceFrom", done, reply);
    }

    fn get_matrix(&self, query: MatrixQuery, done: Completion<MatrixReply>) {
        self.record("getMatrix", to_args(&query));
        let reply = match self.failure("getMatrix") {
            Some(status) => MatrixReply {
                status,
                matrix: None,
            },
            None => {
                let row = vec![fixtures::route(query.units); query.destinations.len()];
                MatrixReply {
                    status: NativeStatus::success(),
                    matrix: Some(vec![row; query.origins.len()]),
                }
            }
        };
        self.complete("getMatrix", done, reply);
    }

    fn validate_address(&self, address: JsonObject, done: Completion<ValidateAddressReply>) {
        self.record("validateAddress", json!({"address": address}));
        let reply = match self.failure("validateAddress") {
            Some(status) => ValidateAddressReply {
                status,
                address: None,
                verification_status: None,
            },
            None => ValidateAddressReply {
                status: NativeStatus::success(),
                address: Some(address),
                verification_status: Some("verified".to_string()),
            },
        };
        self.complete("validateAddress", done, reply);
    }

    fn log_conversion(&self, request: ConversionRequest, done: Completion<ConversionReply>) {
        self.record("logConversion", to_args(&request));
        let reply = match self.failure("logConversion") {
            Some(status) => ConversionReply {
                status,
                event: None,
            },
            None => {
                let mut event =
                    fixtures::event(&Uuid::new_v4().to_string(), &request.name, self.clock.now());
                if let Some(metadata) = request.metadata {
                    event.insert("metadata".into(), Value::Object(metadata));
                }
                ConversionReply {
                    status: NativeStatus::success(),
                    event: Some(event),
                }
            }
        };
        self.complete("logConversion", done, reply);
    }
}

impl SimulatedSdk {
    fn context_reply(&self, operation: &'static str, location: NativeLocation) -> ContextReply {
        match self.failure(operation) {
            Some(status) => ContextReply {
                status,
                location: None,
                context: None,
            },
            None => ContextReply {
                status: NativeStatus::success(),
                location: Some(location),
                context: Some(fixtures::object(
                    json!({"geofences": self.state().geofences.clone()}),
                )),
            },
        }
    }

    fn places_reply(&self, operation: &'static str, location: NativeLocation) -> SearchPlacesReply {
        match self.failure(operation) {
            Some(status) => SearchPlacesReply {
                status,
                location: None,
                places: None,
            },
            None => SearchPlacesReply {
                status: NativeStatus::success(),
                location: Some(location),
                places: Some(self.state().places.clone()),
            },
        }
    }

    fn geofences_reply(
        &self,
        operation: &'static str,
        location: NativeLocation,
    ) -> SearchGeofencesReply {
        match self.failure(operation) {
            Some(status) => SearchGeofencesReply {
                status,
                location: None,
                geofences: None,
            },
            None => SearchGeofencesReply {
                status: NativeStatus::success(),
                location: Some(location),
                geofences: Some(self.state().geofences.clone()),
            },
        }
    }

    fn geocode_reply(&self, operation: &'static str) -> GeocodeReply {
        match self.failure(operation) {
            Some(status) => GeocodeReply {
                status,
                addresses: None,
            },
            None => GeocodeReply {
                status: NativeStatus::success(),
                addresses: Some(self.state().addresses.clone()),
            },
        }
    }

    fn route_reply(&self, operation: &'static str, query: &RouteQuery) -> RouteReply {
        match self.failure(operation) {
            Some(status) => RouteReply {
                status,
                routes: None,
            },
            None => RouteReply {
                status: NativeStatus::success(),
                routes: Some(fixtures::routes(&query.modes, query.units)),
            },
        }
    }
}
