//! The bridge's single native delegate.
//!
//! Installed once when the bridge is built. Each callback is normalized into
//! a [`BridgeEvent`] and published to the multiplexer; a payload that cannot
//! be normalized is logged and dropped rather than delivered half-converted.
//! Trip statuses carried by events or the user are applied to the shared
//! [`TripCell`] before the event is published.

use bridge_traits::native::{NativeLocationSource, NativeStatus};
use bridge_traits::{JsonObject, NativeLocation, NativeReceiver};
use core_runtime::events::{BridgeEvent, BridgeEventKind, EventMultiplexer};
use core_runtime::logging::{coarsen_coordinate, NATIVE_LOG_TARGET};
use core_schema::{
    events_from_native, Location, LocationSource, SchemaError, Status, User,
    VerifiedLocationToken,
};
use tracing::{debug, error, warn};

use crate::trip::{reported_trips, TripCell};

pub struct NativeRelay {
    events: EventMultiplexer,
    trips: TripCell,
    forward_logs: bool,
}

impl NativeRelay {
    pub fn new(events: EventMultiplexer, trips: TripCell, forward_logs: bool) -> Self {
        Self {
            events,
            trips,
            forward_logs,
        }
    }

    fn publish(&self, kind: BridgeEventKind, event: std::result::Result<BridgeEvent, SchemaError>) {
        match event {
            Ok(event) => self.events.publish(event),
            Err(e) => error!(event = %kind, error = %e, "Dropping malformed native payload"),
        }
    }
}

impl NativeReceiver for NativeRelay {
    fn on_events_received(&self, events: Vec<JsonObject>, user: Option<JsonObject>) {
        debug!(count = events.len(), "Native events received");
        let event = events_from_native(&events).and_then(|events| {
            let user = user.as_ref().map(User::from_json).transpose()?;
            Ok(BridgeEvent::Events { events, user })
        });
        if let Ok(BridgeEvent::Events { events, user }) = &event {
            self.trips.observe(reported_trips(events, user.as_ref()));
        }
        self.publish(BridgeEventKind::Events, event);
    }

    fn on_location_updated(&self, location: NativeLocation, user: JsonObject) {
        debug!(
            latitude = coarsen_coordinate(location.latitude),
            longitude = coarsen_coordinate(location.longitude),
            "Native location updated"
        );
        let event = Location::from_native(&location).and_then(|location| {
            Ok(BridgeEvent::Location {
                location,
                user: User::from_json(&user)?,
            })
        });
        if let Ok(BridgeEvent::Location { user, .. }) = &event {
            self.trips.observe(user.trip.iter());
        }
        self.publish(BridgeEventKind::Location, event);
    }

    fn on_client_location_updated(
        &self,
        location: NativeLocation,
        stopped: bool,
        source: NativeLocationSource,
    ) {
        let event = Location::from_native(&location).map(|location| BridgeEvent::ClientLocation {
            location,
            stopped,
            source: LocationSource::from_native(source),
        });
        self.publish(BridgeEventKind::ClientLocation, event);
    }

    fn on_error(&self, status: NativeStatus) {
        let status = Status::from_native(&status);
        warn!(status = %status, "Native SDK reported an error");
        self.events.publish(BridgeEvent::Error { status });
    }

    fn on_log(&self, message: String) {
        if self.forward_logs {
            debug!(target: NATIVE_LOG_TARGET, "{}", message);
        }
        self.events.publish(BridgeEvent::Log { message });
    }

    fn on_token_updated(&self, token: JsonObject) {
        let event = VerifiedLocationToken::from_json(&token).map(|token| BridgeEvent::Token { token });
        self.publish(BridgeEventKind::Token, event);
    }
}
