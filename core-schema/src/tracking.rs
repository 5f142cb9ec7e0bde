//! Tracking Options
//!
//! Canonical tracking configuration. Enum-valued fields come from
//! server-delivered or remotely configured payloads, so unknown values fail
//! closed to a documented default instead of rejecting the whole object.
//! Missing fields take the efficient preset's values.

use bridge_traits::native::{
    NativeDesiredAccuracy, NativeForegroundServiceOptions, NativeReplay, NativeSync,
    NativeTrackingOptions,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::string_enum;

string_enum! {
    pub enum DesiredAccuracy {
        High => "high",
        Medium => "medium",
        Low => "low",
        None => "none",
    }
    fallback = Medium;
}

impl DesiredAccuracy {
    pub fn to_native(self) -> NativeDesiredAccuracy {
        match self {
            DesiredAccuracy::High => NativeDesiredAccuracy::High,
            DesiredAccuracy::Medium => NativeDesiredAccuracy::Medium,
            DesiredAccuracy::Low => NativeDesiredAccuracy::Low,
            DesiredAccuracy::None => NativeDesiredAccuracy::None,
        }
    }

    pub fn from_native(native: NativeDesiredAccuracy) -> Self {
        match native {
            NativeDesiredAccuracy::High => DesiredAccuracy::High,
            NativeDesiredAccuracy::Medium => DesiredAccuracy::Medium,
            NativeDesiredAccuracy::Low => DesiredAccuracy::Low,
            NativeDesiredAccuracy::None => DesiredAccuracy::None,
        }
    }
}

impl Default for DesiredAccuracy {
    fn default() -> Self {
        DesiredAccuracy::Medium
    }
}

string_enum! {
    pub enum SyncPolicy {
        None => "none",
        StopsAndExits => "stopsAndExits",
        All => "all",
    }
    fallback = All;
}

impl SyncPolicy {
    pub fn to_native(self) -> NativeSync {
        match self {
            SyncPolicy::None => NativeSync::None,
            SyncPolicy::StopsAndExits => NativeSync::StopsAndExits,
            SyncPolicy::All => NativeSync::All,
        }
    }

    pub fn from_native(native: NativeSync) -> Self {
        match native {
            NativeSync::None => SyncPolicy::None,
            NativeSync::StopsAndExits => SyncPolicy::StopsAndExits,
            NativeSync::All => SyncPolicy::All,
        }
    }
}

string_enum! {
    pub enum ReplayPolicy {
        None => "none",
        Stops => "stops",
        All => "all",
    }
    fallback = Stops;
}

impl ReplayPolicy {
    pub fn to_native(self) -> NativeReplay {
        match self {
            ReplayPolicy::None => NativeReplay::None,
            ReplayPolicy::Stops => NativeReplay::Stops,
            ReplayPolicy::All => NativeReplay::All,
        }
    }

    pub fn from_native(native: NativeReplay) -> Self {
        match native {
            NativeReplay::None => ReplayPolicy::None,
            NativeReplay::Stops => ReplayPolicy::Stops,
            NativeReplay::All => ReplayPolicy::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingOptions {
    pub desired_stopped_update_interval: i32,
    pub desired_moving_update_interval: i32,
    pub desired_sync_interval: i32,
    pub desired_accuracy: DesiredAccuracy,
    pub stop_duration: i32,
    pub stop_distance: i32,
    pub start_tracking_after: Option<DateTime<Utc>>,
    pub stop_tracking_after: Option<DateTime<Utc>>,
    pub replay: ReplayPolicy,
    pub sync: SyncPolicy,
    pub use_stopped_geofence: bool,
    pub stopped_geofence_radius: i32,
    pub use_moving_geofence: bool,
    pub moving_geofence_radius: i32,
    pub sync_geofences: bool,
    pub sync_geofences_limit: i32,
    pub foreground_service_enabled: bool,
    pub beacons: bool,
}

impl TrackingOptions {
    pub fn efficient() -> Self {
        Self::from_native(&NativeTrackingOptions::efficient())
    }

    pub fn responsive() -> Self {
        Self::from_native(&NativeTrackingOptions::responsive())
    }

    pub fn continuous() -> Self {
        Self::from_native(&NativeTrackingOptions::continuous())
    }

    pub fn to_native(&self) -> NativeTrackingOptions {
        NativeTrackingOptions {
            desired_stopped_update_interval: self.desired_stopped_update_interval,
            desired_moving_update_interval: self.desired_moving_update_interval,
            desired_sync_interval: self.desired_sync_interval,
            desired_accuracy: self.desired_accuracy.to_native(),
            stop_duration: self.stop_duration,
            stop_distance: self.stop_distance,
            start_tracking_after: self.start_tracking_after,
            stop_tracking_after: self.stop_tracking_after,
            replay: self.replay.to_native(),
            sync: self.sync.to_native(),
            use_stopped_geofence: self.use_stopped_geofence,
            stopped_geofence_radius: self.stopped_geofence_radius,
            use_moving_geofence: self.use_moving_geofence,
            moving_geofence_radius: self.moving_geofence_radius,
            sync_geofences: self.sync_geofences,
            sync_geofences_limit: self.sync_geofences_limit,
            foreground_service_enabled: self.foreground_service_enabled,
            beacons: self.beacons,
        }
    }

    pub fn from_native(native: &NativeTrackingOptions) -> Self {
        Self {
            desired_stopped_update_interval: native.desired_stopped_update_interval,
            desired_moving_update_interval: native.desired_moving_update_interval,
            desired_sync_interval: native.desired_sync_interval,
            desired_accuracy: DesiredAccuracy::from_native(native.desired_accuracy),
            stop_duration: native.stop_duration,
            stop_distance: native.stop_distance,
            start_tracking_after: native.start_tracking_after,
            stop_tracking_after: native.stop_tracking_after,
            replay: ReplayPolicy::from_native(native.replay),
            sync: SyncPolicy::from_native(native.sync),
            use_stopped_geofence: native.use_stopped_geofence,
            stopped_geofence_radius: native.stopped_geofence_radius,
            use_moving_geofence: native.use_moving_geofence,
            moving_geofence_radius: native.moving_geofence_radius,
            sync_geofences: native.sync_geofences,
            sync_geofences_limit: native.sync_geofences_limit,
            foreground_service_enabled: native.foreground_service_enabled,
            beacons: native.beacons,
        }
    }
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self::efficient()
    }
}

/// Android foreground service notification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForegroundServiceOptions {
    pub text: Option<String>,
    pub title: Option<String>,
    pub update_existing: bool,
    pub activity: Option<String>,
    pub importance: Option<i32>,
    pub id: Option<i32>,
    pub channel_name: Option<String>,
    pub icon_string: Option<String>,
    pub icon_color: Option<String>,
}

impl ForegroundServiceOptions {
    pub fn to_native(&self) -> NativeForegroundServiceOptions {
        NativeForegroundServiceOptions {
            text: self.text.clone(),
            title: self.title.clone(),
            update_existing: self.update_existing,
            activity: self.activity.clone(),
            importance: self.importance,
            id: self.id,
            channel_name: self.channel_name.clone(),
            icon_string: self.icon_string.clone(),
            icon_color: self.icon_color.clone(),
        }
    }
}
