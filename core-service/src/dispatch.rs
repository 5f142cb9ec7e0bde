//! Host command dispatch by wire name.
//!
//! Plugin shells receive `(command, args)` pairs from the host runtime and
//! need a JSON result or a [`Rejection`](crate::Rejection) back. This module
//! routes each pair to the typed [`LocationBridge`] API. The order of checks
//! is fixed: unknown command, platform support, argument decoding, then the
//! native call.

use bridge_traits::Operation;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::bridge::LocationBridge;
use crate::error::{CoreError, Rejection, Result};
use crate::requests::{
    address_from_args, desired_accuracy_from_args, foreground_service_options_from_args,
    log_level_from_args, metadata_from_args, tracking_options_from_args, AcceptEventRequest, Args,
    AutocompleteRequest, ConversionRequest, DistanceRequest, GeocodeRequest, InitializeRequest,
    MatrixRequest, MockTrackingRequest, ReverseGeocodeRequest, SearchGeofencesRequest,
    SearchPlacesRequest, StartTrackingVerifiedRequest, StartTripRequest, TrackOnceRequest,
    UpdateTripRequest,
};

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn done(result: Result<()>) -> Result<Value> {
    result.map(|()| Value::Null)
}

impl LocationBridge {
    /// Runs one host command. Commands without a result resolve to `null`.
    #[instrument(skip(self, args))]
    pub async fn dispatch(&self, command: &str, args: Value) -> Result<Value> {
        let operation = Operation::from_name(command)
            .ok_or_else(|| CoreError::UnknownCommand(command.to_string()))?;
        if !self.supported(operation)? {
            return Ok(Value::Null);
        }
        let args = Args::new(args)?;
        debug!(operation = %operation, "Dispatching host command");

        match operation {
            Operation::Initialize => done(self.initialize(InitializeRequest::from_args(&args)?).await),
            Operation::SetLogLevel => done(self.set_log_level(log_level_from_args(&args)?).await),
            Operation::SetUserId => done(self.set_user_id(args.opt_str("userId")?).await),
            Operation::GetUserId => to_json(self.get_user_id().await?),
            Operation::SetDescription => {
                done(self.set_description(args.opt_str("description")?).await)
            }
            Operation::GetDescription => to_json(self.get_description().await?),
            Operation::SetMetadata => done(self.set_metadata(metadata_from_args(&args)?).await),
            Operation::GetMetadata => to_json(self.get_metadata().await?),
            Operation::SetAnonymousTrackingEnabled => done(
                self.set_anonymous_tracking_enabled(args.required_bool("enabled")?)
                    .await,
            ),

            Operation::GetLocationPermissionsStatus => {
                to_json(self.get_location_permissions_status().await?)
            }
            Operation::RequestLocationPermissions => done(
                self.request_location_permissions(args.opt_bool("background")?.unwrap_or(false))
                    .await,
            ),

            Operation::GetLocation => {
                to_json(self.get_location(desired_accuracy_from_args(&args)?).await?)
            }
            Operation::TrackOnce => to_json(self.track_once(TrackOnceRequest::from_args(&args)?).await?),
            Operation::TrackVerified => to_json(
                self.track_verified(args.opt_bool("beacons")?.unwrap_or(false))
                    .await?,
            ),
            Operation::GetVerifiedLocationToken => {
                to_json(self.get_verified_location_token().await?)
            }
            Operation::StartTrackingVerified => done(
                self.start_tracking_verified(StartTrackingVerifiedRequest::from_args(&args)?)
                    .await,
            ),
            Operation::StopTrackingVerified => done(self.stop_tracking_verified().await),
            Operation::StartTrackingEfficient => done(self.start_tracking_efficient().await),
            Operation::StartTrackingResponsive => done(self.start_tracking_responsive().await),
            Operation::StartTrackingContinuous => done(self.start_tracking_continuous().await),
            Operation::StartTrackingCustom => done(
                self.start_tracking_custom(tracking_options_from_args(&args)?)
                    .await,
            ),
            Operation::MockTracking => {
                done(self.mock_tracking(MockTrackingRequest::from_args(&args)?).await)
            }
            Operation::StopTracking => done(self.stop_tracking().await),
            Operation::IsTracking => to_json(self.is_tracking().await?),
            Operation::GetTrackingOptions => to_json(self.get_tracking_options().await?),
            Operation::SetForegroundServiceOptions => done(
                self.set_foreground_service_options(foreground_service_options_from_args(&args)?)
                    .await,
            ),

            Operation::StartTrip => to_json(self.start_trip(StartTripRequest::from_args(&args)?).await?),
            Operation::UpdateTrip => {
                to_json(self.update_trip(UpdateTripRequest::from_args(&args)?).await?)
            }
            Operation::CompleteTrip => to_json(self.complete_trip().await?),
            Operation::CancelTrip => to_json(self.cancel_trip().await?),
            Operation::GetTripOptions => to_json(self.get_trip_options().await?),

            Operation::AcceptEvent => {
                done(self.accept_event(AcceptEventRequest::from_args(&args)?).await)
            }
            Operation::RejectEvent => done(self.reject_event(args.required_str("eventId")?).await),

            Operation::GetContext => to_json(self.get_context(args.inline_location()?).await?),
            Operation::SearchPlaces => {
                to_json(self.search_places(SearchPlacesRequest::from_args(&args)?).await?)
            }
            Operation::SearchGeofences => to_json(
                self.search_geofences(SearchGeofencesRequest::from_args(&args)?)
                    .await?,
            ),
            Operation::Autocomplete => {
                to_json(self.autocomplete(AutocompleteRequest::from_args(&args)?).await?)
            }
            Operation::Geocode => to_json(self.geocode(GeocodeRequest::from_args(&args)?).await?),
            Operation::ReverseGeocode => to_json(
                self.reverse_geocode(ReverseGeocodeRequest::from_args(&args)?)
                    .await?,
            ),
            Operation::IpGeocode => to_json(self.ip_geocode().await?),
            Operation::GetDistance => {
                to_json(self.get_distance(DistanceRequest::from_args(&args)?).await?)
            }
            Operation::GetMatrix => to_json(self.get_matrix(MatrixRequest::from_args(&args)?).await?),
            Operation::ValidateAddress => {
                to_json(self.validate_address(address_from_args(&args)?).await?)
            }
            Operation::LogConversion => {
                to_json(self.log_conversion(ConversionRequest::from_args(&args)?).await?)
            }
        }
    }

    /// [`dispatch`](Self::dispatch) with the error rendered for the host.
    pub async fn call(&self, command: &str, args: Value) -> std::result::Result<Value, Rejection> {
        self.dispatch(command, args)
            .await
            .map_err(|e| e.to_rejection())
    }
}
