//! # Trip Lifecycle
//!
//! The bridge's record of the active trip. It is the only mutable state the
//! bridge owns. [`TripCell`] shares it between the bridge's commands and the
//! native relay; each side locks it only for a check or a write, never across
//! a native call. [`LocationBridge`](crate::LocationBridge) serializes the
//! trip commands themselves with a separate async lock.
//!
//! Checks (`check_*`) run before the native call and never mutate.
//! Recording (`record_*`) runs only after the native SDK reported success.
//! [`observe`](TripLifecycle::observe) applies statuses the SDK reports on
//! its own, through trip events or a tracking reply.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use core_schema::{Event, Trip, TripOptions, TripStatus, User};
use tracing::{debug, info};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTrip {
    pub options: TripOptions,
    pub trip: Trip,
}

impl ActiveTrip {
    pub fn external_id(&self) -> &str {
        &self.options.external_id
    }

    pub fn status(&self) -> TripStatus {
        self.trip.status
    }
}

#[derive(Debug, Default)]
pub struct TripLifecycle {
    active: Option<ActiveTrip>,
}

impl TripLifecycle {
    pub fn active(&self) -> Option<&ActiveTrip> {
        self.active.as_ref()
    }

    /// `Unknown` when no trip is active.
    pub fn status(&self) -> TripStatus {
        self.active
            .as_ref()
            .map_or(TripStatus::Unknown, ActiveTrip::status)
    }

    pub fn options(&self) -> Option<&TripOptions> {
        self.active.as_ref().map(|active| &active.options)
    }

    pub fn check_start(&self, allow_replacement: bool) -> Result<()> {
        match &self.active {
            Some(active) if !allow_replacement => Err(CoreError::TripAlreadyActive {
                external_id: active.external_id().to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn check_update(&self, options: &TripOptions, forced: TripStatus) -> Result<()> {
        let active = self.active.as_ref().ok_or(CoreError::NoActiveTrip)?;
        if active.external_id() != options.external_id {
            return Err(CoreError::TripMismatch {
                active: active.external_id().to_string(),
                requested: options.external_id.clone(),
            });
        }
        if forced != TripStatus::Unknown && !active.status().can_transition_to(forced) {
            return Err(CoreError::InvalidTransition {
                from: active.status(),
                to: forced,
            });
        }
        Ok(())
    }

    /// Records a trip the SDK accepted. `reply` is the SDK's echo, if any.
    pub fn record_started(&mut self, options: TripOptions, reply: Option<Trip>) -> &ActiveTrip {
        let trip = matching(reply, &options)
            .unwrap_or_else(|| Trip::from_options(&options, TripStatus::Started));
        if let Some(previous) = &self.active {
            info!(
                previous = previous.external_id(),
                external_id = %options.external_id,
                "Replacing active trip"
            );
        } else {
            info!(external_id = %options.external_id, status = %trip.status, "Trip started");
        }
        self.settle(ActiveTrip { options, trip })
    }

    /// Records a confirmed update and returns the resulting trip. A terminal
    /// status ends the trip.
    pub fn record_updated(
        &mut self,
        options: TripOptions,
        forced: TripStatus,
        reply: Option<Trip>,
    ) -> Trip {
        let previous = self.status();
        let expected = if forced == TripStatus::Unknown {
            previous
        } else {
            forced
        };
        let trip = match matching(reply, &options) {
            Some(mut trip) => {
                if trip.status == TripStatus::Unknown {
                    trip.status = expected;
                }
                trip
            }
            None => Trip::from_options(&options, expected),
        };
        info!(
            external_id = %options.external_id,
            from = %previous,
            to = %trip.status,
            "Trip updated"
        );
        if trip.status.is_terminal() {
            info!(
                external_id = %options.external_id,
                status = %trip.status,
                "Trip reached a terminal status"
            );
            self.active = None;
            return trip;
        }
        self.settle(ActiveTrip { options, trip }).trip.clone()
    }

    /// Ends the active trip after a confirmed complete or cancel.
    pub fn record_finished(&mut self, status: TripStatus) -> Option<ActiveTrip> {
        let finished = self.active.take();
        match &finished {
            Some(active) => info!(external_id = active.external_id(), status = %status, "Trip ended"),
            None => debug!(status = %status, "Trip ended with no trip on record"),
        }
        finished
    }

    /// Applies a trip status the SDK reported without being asked, e.g. a
    /// geofence-driven arrival or a server-side expiry. Only the active trip
    /// moves, and only along the status lattice; a terminal status ends it.
    /// Returns whether anything changed.
    pub fn observe(&mut self, reported: &Trip) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.external_id() != reported.external_id || active.status() == reported.status {
            return false;
        }
        let from = active.status();
        if !from.can_transition_to(reported.status) {
            debug!(
                external_id = %reported.external_id,
                from = %from,
                to = %reported.status,
                "Ignoring out-of-order trip status"
            );
            return false;
        }
        if reported.status.is_terminal() {
            info!(
                external_id = %reported.external_id,
                status = %reported.status,
                "Trip ended by the SDK"
            );
            self.active = None;
        } else {
            info!(
                external_id = %reported.external_id,
                from = %from,
                to = %reported.status,
                "Trip status reported by the SDK"
            );
            active.trip.status = reported.status;
        }
        true
    }

    fn settle(&mut self, active: ActiveTrip) -> &ActiveTrip {
        self.active.insert(active)
    }
}

/// Shared handle on the trip lifecycle.
#[derive(Debug, Clone, Default)]
pub struct TripCell(Arc<Mutex<TripLifecycle>>);

impl TripCell {
    /// Locks the lifecycle. Never hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, TripLifecycle> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn observe<'a>(&self, reported: impl IntoIterator<Item = &'a Trip>) {
        let mut lifecycle = self.lock();
        for trip in reported {
            lifecycle.observe(trip);
        }
    }
}

/// Trips carried by a batch of events, then the user's current trip.
pub fn reported_trips<'a>(
    events: &'a [Event],
    user: Option<&'a User>,
) -> impl Iterator<Item = &'a Trip> + 'a {
    events
        .iter()
        .filter_map(|event| event.trip.as_ref())
        .chain(user.and_then(|user| user.trip.as_ref()))
}

/// Keeps the SDK's echo only when it describes the trip we asked for.
fn matching(reply: Option<Trip>, options: &TripOptions) -> Option<Trip> {
    reply.filter(|trip| trip.external_id == options.external_id)
}
