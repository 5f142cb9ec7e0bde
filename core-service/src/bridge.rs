//! # Location Bridge
//!
//! Typed async command surface over a [`LocationSdk`].
//!
//! ## Overview
//!
//! Every native command follows the same path:
//!
//! 1. **Platform gate**: unsupported commands either no-op or reject with
//!    [`CoreError::NotImplemented`], before anything else happens
//! 2. **Conversion**: canonical arguments become native values; invalid
//!    coordinates or enum values fail here, with zero native calls
//! 3. **Native round trip**: the completion handler is bridged to a
//!    `tokio::sync::oneshot`, so the caller resolves exactly once
//! 4. **Status check**: anything but `SUCCESS` rejects, even when the SDK
//!    attached partial data
//! 5. **Normalization**: the reply becomes the canonical response
//!
//! Optional coordinates select the SDK overload: an absent `near`, `origin`
//! or location means "relative to the device's current location".
//!
//! ## Usage
//!
//! ```ignore
//! use core_service::{LocationBridge, requests::SearchPlacesRequest};
//!
//! let bridge = LocationBridge::new(config)?;
//! let places = bridge
//!     .search_places(SearchPlacesRequest {
//!         categories: Some(vec!["coffee-shop".into()]),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

use std::sync::Arc;

use bridge_traits::native::{
    self, AutocompleteQuery, GeocodeQuery, GeofenceSearch, MatrixQuery, NativeStatus,
    PlaceSearch, RouteQuery, TrackReply, TripReply,
};
use bridge_traits::{Completion, LocationSdk, NativeLocation, Operation, UnsupportedPolicy};
use core_runtime::config::{BridgeConfig, CommandDefaults, FeatureFlags};
use core_runtime::events::{
    BridgeEvent, BridgeEventKind, EventMultiplexer, EventStream, ListenerHandle,
};
use core_runtime::logging::redact_if_sensitive;
use core_schema::{
    events_from_native, list_from_native, Address, AddressVerificationStatus, Context,
    DesiredAccuracy, Event, ForegroundServiceOptions, Geofence, Location, PermissionsStatus, Place,
    RouteMatrix, Routes, SchemaError, SdkLogLevel, Status, TrackingOptions, Trip, TripStatus, User,
    VerifiedLocationToken,
};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::relay::NativeRelay;
use crate::requests::{
    AcceptEventRequest, AutocompleteRequest, ConversionRequest, DistanceRequest, GeocodeRequest,
    InitializeRequest, MatrixRequest, MockTrackingRequest, ReverseGeocodeRequest,
    SearchGeofencesRequest, SearchPlacesRequest, StartTrackingVerifiedRequest, StartTripRequest,
    TrackOnceRequest, UpdateTripRequest,
};
use crate::responses::{
    AddressesResponse, ContextResponse, ConversionResponse, DescriptionResponse, DistanceResponse,
    GeofencesResponse, IpGeocodeResponse, IsTrackingResponse, LocationResponse, MatrixResponse,
    MetadataResponse, PermissionsResponse, PlacesResponse, TokenResponse, TrackResponse,
    TripOptionsResponse, TripResponse, UserIdResponse, ValidateAddressResponse,
};
use crate::trip::{reported_trips, TripCell};

/// Host-facing bridge over one native SDK instance.
///
/// Construct with [`LocationBridge::new`] inside a tokio runtime. The bridge
/// installs its delegate on the SDK exactly once, during construction.
pub struct LocationBridge {
    sdk: Arc<dyn LocationSdk>,
    events: EventMultiplexer,
    /// Serializes trip commands; never taken by queries.
    trip_commands: Mutex<()>,
    trips: TripCell,
    features: FeatureFlags,
    defaults: CommandDefaults,
}

impl std::fmt::Debug for LocationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationBridge")
            .field("sdk", &"LocationSdk { ... }")
            .field("events", &self.events)
            .field("features", &self.features)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl LocationBridge {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let events = EventMultiplexer::new(config.event_buffer_size)?;

        let trips = TripCell::default();
        let relay = NativeRelay::new(
            events.clone(),
            trips.clone(),
            config.features.forward_native_logs,
        );
        config.sdk.set_receiver(Arc::new(relay));

        info!(
            event_buffer_size = config.event_buffer_size,
            allow_trip_replacement = config.features.allow_trip_replacement,
            "Location bridge ready"
        );

        Ok(Self {
            sdk: config.sdk,
            events,
            trip_commands: Mutex::new(()),
            trips,
            features: config.features,
            defaults: config.defaults,
        })
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn events(&self) -> &EventMultiplexer {
        &self.events
    }

    /// Registers a listener by host event name (`location`, `events`, ...).
    pub fn add_listener<F>(&self, event: &str, callback: F) -> Result<ListenerHandle>
    where
        F: Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let kind = event_kind(event)?;
        Ok(self.events.add_listener(kind, callback))
    }

    /// Removes the listeners of one event name, or all of them for `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) -> Result<()> {
        let kind = event.map(event_kind).transpose()?;
        self.events.remove_all_listeners(kind);
        Ok(())
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------------

    /// `Ok(false)` when the platform lacks a fire-and-forget command and the
    /// call should silently succeed.
    pub(crate) fn supported(&self, operation: Operation) -> Result<bool> {
        if operation.is_bridge_local() || self.sdk.supports(operation) {
            return Ok(true);
        }
        match operation.unsupported_policy() {
            UnsupportedPolicy::NoOp => {
                debug!(operation = %operation, "Not supported on this platform; ignoring");
                Ok(false)
            }
            UnsupportedPolicy::Reject => {
                warn!(operation = %operation, "Not supported on this platform");
                Err(CoreError::NotImplemented { operation })
            }
        }
    }

    /// Native value for a caller-supplied location. Locations without an
    /// accuracy get the configured fixed accuracy.
    fn fixed_location(&self, field: &str, location: &Location) -> Result<NativeLocation> {
        let mut location = location.clone();
        if location.accuracy.is_none() {
            location.accuracy = Some(self.defaults.fixed_location_accuracy);
        }
        location
            .to_native()
            .map_err(|e| CoreError::in_field(field, e))
    }

    fn optional_fixed_location(
        &self,
        field: &str,
        location: Option<&Location>,
    ) -> Result<Option<NativeLocation>> {
        location
            .map(|location| self.fixed_location(field, location))
            .transpose()
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub async fn initialize(&self, request: InitializeRequest) -> Result<()> {
        if !self.supported(Operation::Initialize)? {
            return Ok(());
        }
        info!(
            publishable_key = %redact_if_sensitive("publishable_key", &request.publishable_key),
            "Initializing native SDK"
        );
        self.sdk.initialize(&request.publishable_key);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_log_level(&self, level: SdkLogLevel) -> Result<()> {
        if self.supported(Operation::SetLogLevel)? {
            self.sdk.set_log_level(level.to_native());
        }
        Ok(())
    }

    pub async fn set_user_id(&self, user_id: Option<String>) -> Result<()> {
        if self.supported(Operation::SetUserId)? {
            debug!(present = user_id.is_some(), "Setting user id");
            self.sdk.set_user_id(user_id);
        }
        Ok(())
    }

    pub async fn get_user_id(&self) -> Result<UserIdResponse> {
        self.supported(Operation::GetUserId)?;
        Ok(UserIdResponse {
            user_id: self.sdk.user_id(),
        })
    }

    pub async fn set_description(&self, description: Option<String>) -> Result<()> {
        if self.supported(Operation::SetDescription)? {
            self.sdk.set_description(description);
        }
        Ok(())
    }

    pub async fn get_description(&self) -> Result<DescriptionResponse> {
        self.supported(Operation::GetDescription)?;
        Ok(DescriptionResponse {
            description: self.sdk.description(),
        })
    }

    pub async fn set_metadata(&self, metadata: Option<native::JsonObject>) -> Result<()> {
        if self.supported(Operation::SetMetadata)? {
            self.sdk.set_metadata(metadata);
        }
        Ok(())
    }

    pub async fn get_metadata(&self) -> Result<MetadataResponse> {
        self.supported(Operation::GetMetadata)?;
        Ok(MetadataResponse {
            metadata: self.sdk.metadata(),
        })
    }

    #[instrument(skip(self))]
    pub async fn set_anonymous_tracking_enabled(&self, enabled: bool) -> Result<()> {
        if self.supported(Operation::SetAnonymousTrackingEnabled)? {
            self.sdk.set_anonymous_tracking_enabled(enabled);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------------

    pub async fn get_location_permissions_status(&self) -> Result<PermissionsResponse> {
        self.supported(Operation::GetLocationPermissionsStatus)?;
        Ok(PermissionsResponse {
            status: PermissionsStatus::from_native(self.sdk.authorization_status()),
        })
    }

    #[instrument(skip(self))]
    pub async fn request_location_permissions(&self, background: bool) -> Result<()> {
        if self.supported(Operation::RequestLocationPermissions)? {
            self.sdk.request_permissions(background);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Location & tracking
    // ------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_location(&self, desired_accuracy: DesiredAccuracy) -> Result<LocationResponse> {
        let op = Operation::GetLocation;
        self.supported(op)?;
        let reply = await_native(op, |done| {
            self.sdk.get_location(desired_accuracy.to_native(), done)
        })
        .await?;
        let status = succeeded(op, &reply.status)?;
        let location = required(op, "location", reply.location)?;
        Ok(LocationResponse {
            status,
            location: Location::from_native(&location).map_err(malformed(op))?,
            stopped: reply.stopped,
        })
    }

    #[instrument(skip_all)]
    pub async fn track_once(&self, request: TrackOnceRequest) -> Result<TrackResponse> {
        let op = Operation::TrackOnce;
        self.supported(op)?;
        let reply = match request {
            TrackOnceRequest::Device {
                desired_accuracy,
                beacons,
            } => {
                debug!(desired_accuracy = %desired_accuracy, beacons, "Tracking once from device");
                await_native(op, |done| {
                    self.sdk.track_once(desired_accuracy.to_native(), beacons, done)
                })
                .await?
            }
            TrackOnceRequest::Manual { location } => {
                let location = location
                    .to_native()
                    .map_err(|e| CoreError::in_field("location", e))?;
                debug!("Tracking once with a supplied location");
                await_native(op, |done| self.sdk.track_once_at(location, done)).await?
            }
        };
        let response = track_response(op, reply)?;
        self.trips.observe(reported_trips(
            response.events.as_deref().unwrap_or_default(),
            response.user.as_ref(),
        ));
        Ok(response)
    }

    pub async fn track_verified(&self, beacons: bool) -> Result<TokenResponse> {
        let op = Operation::TrackVerified;
        self.supported(op)?;
        let reply = await_native(op, |done| self.sdk.track_verified(beacons, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let token = required(op, "token", reply.token)?;
        Ok(TokenResponse {
            status,
            token: VerifiedLocationToken::from_json(&token).map_err(malformed(op))?,
        })
    }

    pub async fn get_verified_location_token(&self) -> Result<TokenResponse> {
        let op = Operation::GetVerifiedLocationToken;
        self.supported(op)?;
        let reply = await_native(op, |done| self.sdk.get_verified_location_token(done)).await?;
        let status = succeeded(op, &reply.status)?;
        let token = required(op, "token", reply.token)?;
        Ok(TokenResponse {
            status,
            token: VerifiedLocationToken::from_json(&token).map_err(malformed(op))?,
        })
    }

    #[instrument(skip(self))]
    pub async fn start_tracking_verified(&self, request: StartTrackingVerifiedRequest) -> Result<()> {
        if self.supported(Operation::StartTrackingVerified)? {
            let interval = request
                .interval
                .unwrap_or(self.defaults.verified_interval_secs);
            self.sdk.start_tracking_verified(interval, request.beacons);
        }
        Ok(())
    }

    pub async fn stop_tracking_verified(&self) -> Result<()> {
        if self.supported(Operation::StopTrackingVerified)? {
            self.sdk.stop_tracking_verified();
        }
        Ok(())
    }

    pub async fn start_tracking_efficient(&self) -> Result<()> {
        self.start_tracking_with(Operation::StartTrackingEfficient, TrackingOptions::efficient())
    }

    pub async fn start_tracking_responsive(&self) -> Result<()> {
        self.start_tracking_with(Operation::StartTrackingResponsive, TrackingOptions::responsive())
    }

    pub async fn start_tracking_continuous(&self) -> Result<()> {
        self.start_tracking_with(Operation::StartTrackingContinuous, TrackingOptions::continuous())
    }

    pub async fn start_tracking_custom(&self, options: TrackingOptions) -> Result<()> {
        self.start_tracking_with(Operation::StartTrackingCustom, options)
    }

    fn start_tracking_with(&self, operation: Operation, options: TrackingOptions) -> Result<()> {
        if !self.supported(operation)? {
            return Ok(());
        }
        info!(
            operation = %operation,
            desired_accuracy = %options.desired_accuracy,
            "Starting tracking"
        );
        self.sdk.start_tracking(options.to_native());
        Ok(())
    }

    /// Starts a simulated trip between two points. Resolves as soon as the
    /// simulation is handed to the SDK; its completion is only logged.
    #[instrument(skip_all, fields(mode = %request.mode))]
    pub async fn mock_tracking(&self, request: MockTrackingRequest) -> Result<()> {
        let op = Operation::MockTracking;
        if !self.supported(op)? {
            return Ok(());
        }
        let native_request = native::MockTrackingRequest {
            origin: self.fixed_location("origin", &request.origin)?,
            destination: self.fixed_location("destination", &request.destination)?,
            mode: request.mode.require_native("mode")?,
            steps: request.steps.unwrap_or(self.defaults.mock_steps),
            interval_secs: request.interval.unwrap_or(self.defaults.mock_interval_secs),
        };
        let done: Completion<TrackReply> = Box::new(|reply: TrackReply| {
            let status = Status::from_native(&reply.status);
            if status.is_success() {
                debug!("Mock tracking step delivered");
            } else {
                warn!(status = %status, "Mock tracking step failed");
            }
        });
        self.sdk.mock_tracking(native_request, done);
        Ok(())
    }

    pub async fn stop_tracking(&self) -> Result<()> {
        if self.supported(Operation::StopTracking)? {
            info!("Stopping tracking");
            self.sdk.stop_tracking();
        }
        Ok(())
    }

    /// Always asks the SDK; tracking state is never cached here.
    pub async fn is_tracking(&self) -> Result<IsTrackingResponse> {
        self.supported(Operation::IsTracking)?;
        Ok(IsTrackingResponse {
            is_tracking: self.sdk.is_tracking(),
        })
    }

    pub async fn get_tracking_options(&self) -> Result<TrackingOptions> {
        self.supported(Operation::GetTrackingOptions)?;
        Ok(TrackingOptions::from_native(&self.sdk.tracking_options()))
    }

    pub async fn set_foreground_service_options(
        &self,
        options: ForegroundServiceOptions,
    ) -> Result<()> {
        if self.supported(Operation::SetForegroundServiceOptions)? {
            self.sdk.set_foreground_service_options(options.to_native());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Trips
    // ------------------------------------------------------------------------

    #[instrument(skip_all, fields(external_id = %request.trip_options.external_id))]
    pub async fn start_trip(&self, request: StartTripRequest) -> Result<TripResponse> {
        let op = Operation::StartTrip;
        self.supported(op)?;
        let options = request
            .trip_options
            .to_native()
            .map_err(|e| CoreError::in_field("options", e))?;
        let tracking = request.tracking_options.as_ref().map(TrackingOptions::to_native);

        let _serial = self.trip_commands.lock().await;
        self.trips
            .lock()
            .check_start(self.features.allow_trip_replacement)?;

        let reply = await_native(op, |done| self.sdk.start_trip(options, tracking, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let (echo, events) = trip_payload(op, &reply);
        let trip = self
            .trips
            .lock()
            .record_started(request.trip_options, echo)
            .trip
            .clone();

        Ok(TripResponse {
            status,
            trip: Some(trip),
            events,
        })
    }

    #[instrument(skip_all, fields(external_id = %request.options.external_id, status = %request.status))]
    pub async fn update_trip(&self, request: UpdateTripRequest) -> Result<TripResponse> {
        let op = Operation::UpdateTrip;
        self.supported(op)?;
        let options = request
            .options
            .to_native()
            .map_err(|e| CoreError::in_field("options", e))?;

        let _serial = self.trip_commands.lock().await;
        self.trips
            .lock()
            .check_update(&request.options, request.status)?;

        let forced = request.status.to_native();
        let reply = await_native(op, |done| self.sdk.update_trip(options, forced, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let (echo, events) = trip_payload(op, &reply);
        let trip = self
            .trips
            .lock()
            .record_updated(request.options, request.status, echo);

        Ok(TripResponse {
            status,
            trip: Some(trip),
            events,
        })
    }

    pub async fn complete_trip(&self) -> Result<TripResponse> {
        self.finish_trip(Operation::CompleteTrip, TripStatus::Completed)
            .await
    }

    pub async fn cancel_trip(&self) -> Result<TripResponse> {
        self.finish_trip(Operation::CancelTrip, TripStatus::Canceled)
            .await
    }

    /// Forwarded even when no trip is on record: the SDK may hold a trip
    /// this bridge instance never started.
    async fn finish_trip(&self, op: Operation, outcome: TripStatus) -> Result<TripResponse> {
        self.supported(op)?;
        let _serial = self.trip_commands.lock().await;

        let reply = await_native(op, |done| match outcome {
            TripStatus::Canceled => self.sdk.cancel_trip(done),
            _ => self.sdk.complete_trip(done),
        })
        .await?;
        let status = succeeded(op, &reply.status)?;

        let finished = self.trips.lock().record_finished(outcome);
        let (echo, events) = trip_payload(op, &reply);
        let trip = echo.or_else(|| {
            finished.map(|active| Trip {
                status: outcome,
                ..active.trip
            })
        });

        Ok(TripResponse {
            status,
            trip,
            events,
        })
    }

    /// Last confirmed options of the active trip; answered locally.
    pub async fn get_trip_options(&self) -> Result<TripOptionsResponse> {
        Ok(TripOptionsResponse {
            options: self.trips.lock().options().cloned(),
        })
    }

    pub async fn trip_status(&self) -> TripStatus {
        self.trips.lock().status()
    }

    // ------------------------------------------------------------------------
    // Event verification
    // ------------------------------------------------------------------------

    #[instrument(skip_all, fields(event_id = %request.event_id))]
    pub async fn accept_event(&self, request: AcceptEventRequest) -> Result<()> {
        if self.supported(Operation::AcceptEvent)? {
            self.sdk
                .accept_event(request.event_id, request.verified_place_id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn reject_event(&self, event_id: String) -> Result<()> {
        if self.supported(Operation::RejectEvent)? {
            self.sdk.reject_event(event_id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Backend pass-through
    // ------------------------------------------------------------------------

    pub async fn get_context(&self, location: Option<Location>) -> Result<ContextResponse> {
        let op = Operation::GetContext;
        self.supported(op)?;
        let reply = match self.optional_fixed_location("location", location.as_ref())? {
            Some(at) => await_native(op, |done| self.sdk.get_context_at(at, done)).await?,
            None => await_native(op, |done| self.sdk.get_context(done)).await?,
        };
        let status = succeeded(op, &reply.status)?;
        let context = required(op, "context", reply.context)?;
        Ok(ContextResponse {
            status,
            location: optional_location(op, reply.location.as_ref())?,
            context: Context::from_json(&context).map_err(malformed(op))?,
        })
    }

    #[instrument(skip_all, fields(near = request.near.is_some()))]
    pub async fn search_places(&self, request: SearchPlacesRequest) -> Result<PlacesResponse> {
        let op = Operation::SearchPlaces;
        self.supported(op)?;
        let near = self.optional_fixed_location("near", request.near.as_ref())?;
        let search = PlaceSearch {
            radius: request.radius.unwrap_or(self.defaults.search_radius),
            chains: request.chains,
            chain_metadata: request.chain_metadata,
            categories: request.categories,
            groups: request.groups,
            limit: request.limit.unwrap_or(self.defaults.search_limit),
        };
        let reply = match near {
            Some(near) => {
                await_native(op, |done| self.sdk.search_places_near(near, search, done)).await?
            }
            None => await_native(op, |done| self.sdk.search_places(search, done)).await?,
        };
        let status = succeeded(op, &reply.status)?;
        let places = required(op, "places", reply.places)?;
        Ok(PlacesResponse {
            status,
            location: optional_location(op, reply.location.as_ref())?,
            places: list_from_native(&places, Place::from_json).map_err(malformed(op))?,
        })
    }

    #[instrument(skip_all, fields(near = request.near.is_some()))]
    pub async fn search_geofences(
        &self,
        request: SearchGeofencesRequest,
    ) -> Result<GeofencesResponse> {
        let op = Operation::SearchGeofences;
        self.supported(op)?;
        let near = self.optional_fixed_location("near", request.near.as_ref())?;
        let search = GeofenceSearch {
            radius: request.radius.unwrap_or(self.defaults.search_radius),
            tags: request.tags,
            metadata: request.metadata,
            limit: request.limit.unwrap_or(self.defaults.search_limit),
            include_geometry: request.include_geometry,
        };
        let reply = match near {
            Some(near) => {
                await_native(op, |done| self.sdk.search_geofences_near(near, search, done))
                    .await?
            }
            None => await_native(op, |done| self.sdk.search_geofences(search, done)).await?,
        };
        let status = succeeded(op, &reply.status)?;
        let geofences = required(op, "geofences", reply.geofences)?;
        Ok(GeofencesResponse {
            status,
            location: optional_location(op, reply.location.as_ref())?,
            geofences: list_from_native(&geofences, Geofence::from_json)
                .map_err(malformed(op))?,
        })
    }

    pub async fn autocomplete(&self, request: AutocompleteRequest) -> Result<AddressesResponse> {
        let op = Operation::Autocomplete;
        self.supported(op)?;
        let query = AutocompleteQuery {
            near: self.optional_fixed_location("near", request.near.as_ref())?,
            query: request.query,
            layers: request.layers,
            limit: request.limit.unwrap_or(self.defaults.search_limit),
            country: request.country,
            expand_units: request.expand_units,
            mailable: request.mailable,
        };
        let reply = await_native(op, |done| self.sdk.autocomplete(query, done)).await?;
        addresses_response(op, reply.status, reply.addresses)
    }

    pub async fn geocode(&self, request: GeocodeRequest) -> Result<AddressesResponse> {
        let op = Operation::Geocode;
        self.supported(op)?;
        let query = GeocodeQuery {
            address: request.query,
            layers: request.layers,
            countries: request.countries,
        };
        let reply = await_native(op, |done| self.sdk.geocode(query, done)).await?;
        addresses_response(op, reply.status, reply.addresses)
    }

    pub async fn reverse_geocode(
        &self,
        request: ReverseGeocodeRequest,
    ) -> Result<AddressesResponse> {
        let op = Operation::ReverseGeocode;
        self.supported(op)?;
        let layers = request.layers;
        let reply = match self.optional_fixed_location("location", request.location.as_ref())? {
            Some(at) => {
                await_native(op, |done| self.sdk.reverse_geocode_at(at, layers, done)).await?
            }
            None => await_native(op, |done| self.sdk.reverse_geocode(layers, done)).await?,
        };
        addresses_response(op, reply.status, reply.addresses)
    }

    pub async fn ip_geocode(&self) -> Result<IpGeocodeResponse> {
        let op = Operation::IpGeocode;
        self.supported(op)?;
        let reply = await_native(op, |done| self.sdk.ip_geocode(done)).await?;
        let status = succeeded(op, &reply.status)?;
        let address = required(op, "address", reply.address)?;
        Ok(IpGeocodeResponse {
            status,
            address: Address::from_json(&address).map_err(malformed(op))?,
            proxy: reply.proxy,
        })
    }

    #[instrument(skip_all, fields(origin = request.origin.is_some(), units = %request.units))]
    pub async fn get_distance(&self, request: DistanceRequest) -> Result<DistanceResponse> {
        let op = Operation::GetDistance;
        self.supported(op)?;
        let origin = self.optional_fixed_location("origin", request.origin.as_ref())?;
        let destination = self.fixed_location("destination", &request.destination)?;
        let query = RouteQuery {
            modes: request
                .modes
                .iter()
                .map(|mode| mode.require_native("modes"))
                .collect::<std::result::Result<Vec<_>, SchemaError>>()?,
            units: request.units.to_native(),
        };
        let reply = match origin {
            Some(origin) => {
                await_native(op, |done| {
                    self.sdk.get_distance_from(origin, destination, query, done)
                })
                .await?
            }
            None => {
                await_native(op, |done| self.sdk.get_distance(destination, query, done)).await?
            }
        };
        let status = succeeded(op, &reply.status)?;
        let routes = required(op, "routes", reply.routes)?;
        Ok(DistanceResponse {
            status,
            routes: Routes::from_json(&routes).map_err(malformed(op))?,
        })
    }

    #[instrument(skip_all, fields(origins = request.origins.len(), destinations = request.destinations.len()))]
    pub async fn get_matrix(&self, request: MatrixRequest) -> Result<MatrixResponse> {
        let op = Operation::GetMatrix;
        self.supported(op)?;
        let origins = self.fixed_locations("origins", &request.origins)?;
        let destinations = self.fixed_locations("destinations", &request.destinations)?;
        let query = MatrixQuery {
            origins,
            destinations,
            mode: request.mode.require_native("mode")?,
            units: request.units.to_native(),
        };
        let reply = await_native(op, |done| self.sdk.get_matrix(query, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let matrix = required(op, "matrix", reply.matrix)?;
        Ok(MatrixResponse {
            status,
            matrix: RouteMatrix::from_native(&matrix).map_err(malformed(op))?,
        })
    }

    fn fixed_locations(&self, field: &str, locations: &[Location]) -> Result<Vec<NativeLocation>> {
        locations
            .iter()
            .enumerate()
            .map(|(index, location)| self.fixed_location(&format!("{field}[{index}]"), location))
            .collect()
    }

    pub async fn validate_address(&self, address: Address) -> Result<ValidateAddressResponse> {
        let op = Operation::ValidateAddress;
        self.supported(op)?;
        let native_address = address.to_native();
        let reply = await_native(op, |done| self.sdk.validate_address(native_address, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let address = required(op, "address", reply.address)?;
        Ok(ValidateAddressResponse {
            status,
            address: Address::from_json(&address).map_err(malformed(op))?,
            verification_status: reply
                .verification_status
                .as_deref()
                .map_or(AddressVerificationStatus::Unknown, AddressVerificationStatus::parse),
        })
    }

    #[instrument(skip_all, fields(name = %request.name))]
    pub async fn log_conversion(&self, request: ConversionRequest) -> Result<ConversionResponse> {
        let op = Operation::LogConversion;
        self.supported(op)?;
        let native_request = native::ConversionRequest {
            name: request.name,
            revenue: request.revenue,
            metadata: request.metadata,
        };
        let reply = await_native(op, |done| self.sdk.log_conversion(native_request, done)).await?;
        let status = succeeded(op, &reply.status)?;
        let event = required(op, "event", reply.event)?;
        Ok(ConversionResponse {
            status,
            event: Event::from_json(&event).map_err(malformed(op))?,
        })
    }
}

fn event_kind(name: &str) -> Result<BridgeEventKind> {
    BridgeEventKind::from_name(name).ok_or_else(|| CoreError::UnknownEvent(name.to_string()))
}

/// Runs one callback-style native command and waits for its completion.
///
/// The completion is `FnOnce`, so the caller resolves at most once; if the
/// SDK drops it without calling, the command rejects instead of hanging on
/// a closed channel.
async fn await_native<T, F>(operation: Operation, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Completion<T>),
{
    let (tx, rx) = oneshot::channel();
    debug!(operation = %operation, "Forwarding to native SDK");
    call(Box::new(move |reply| {
        // The receiver is gone only if the caller stopped waiting.
        let _ = tx.send(reply);
    }));
    rx.await.map_err(|_| {
        error!(operation = %operation, "Native completion dropped without a reply");
        CoreError::CallbackDropped { operation }
    })
}

fn succeeded(operation: Operation, status: &NativeStatus) -> Result<Status> {
    let canonical = Status::from_native(status);
    if canonical.is_success() {
        return Ok(canonical);
    }
    warn!(operation = %operation, status = %canonical, raw = %status, "Native command failed");
    Err(CoreError::Native {
        operation,
        status: canonical,
    })
}

fn required<T>(operation: Operation, field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| {
        warn!(operation = %operation, field, "Native success without a required payload");
        CoreError::IncompleteResponse { operation, field }
    })
}

fn malformed(operation: Operation) -> impl FnOnce(SchemaError) -> CoreError {
    move |source| {
        error!(operation = %operation, error = %source, "Malformed native payload");
        CoreError::MalformedResponse { operation, source }
    }
}

fn optional_location(operation: Operation, location: Option<&NativeLocation>) -> Result<Option<Location>> {
    location
        .map(Location::from_native)
        .transpose()
        .map_err(malformed(operation))
}

fn track_response(op: Operation, reply: TrackReply) -> Result<TrackResponse> {
    let status = succeeded(op, &reply.status)?;
    let location = required(op, "location", reply.location)?;
    Ok(TrackResponse {
        status,
        location: Location::from_native(&location).map_err(malformed(op))?,
        events: reply
            .events
            .as_deref()
            .map(events_from_native)
            .transpose()
            .map_err(malformed(op))?,
        user: reply
            .user
            .as_ref()
            .map(User::from_json)
            .transpose()
            .map_err(malformed(op))?,
    })
}

fn addresses_response(
    op: Operation,
    status: NativeStatus,
    addresses: Option<Vec<native::JsonObject>>,
) -> Result<AddressesResponse> {
    let status = succeeded(op, &status)?;
    let addresses = required(op, "addresses", addresses)?;
    Ok(AddressesResponse {
        status,
        addresses: list_from_native(&addresses, Address::from_json).map_err(malformed(op))?,
    })
}

/// Trip and events from a successful trip reply. The native call already
/// succeeded, so a malformed payload is logged and omitted rather than
/// failing the command.
fn trip_payload(op: Operation, reply: &TripReply) -> (Option<Trip>, Option<Vec<Event>>) {
    let trip = reply.trip.as_ref().and_then(|trip| {
        Trip::from_json(trip)
            .map_err(|e| error!(operation = %op, error = %e, "Dropping malformed trip"))
            .ok()
    });
    let events = reply.events.as_deref().and_then(|events| {
        events_from_native(events)
            .map_err(|e| error!(operation = %op, error = %e, "Dropping malformed trip events"))
            .ok()
    });
    (trip, events)
}
