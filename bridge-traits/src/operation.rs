//! Command Table
//!
//! Closed list of every command the bridge exposes, keyed by its host wire
//! name. Adapters use it to declare platform gaps through
//! [`LocationSdk::supports`](crate::sdk::LocationSdk::supports); the
//! dispatcher uses it to route host calls and to pick the unsupported-command
//! policy.

use serde::Serialize;
use std::fmt;

/// What the bridge does when the platform cannot perform a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    /// Fire-and-forget command: resolve successfully without doing anything.
    NoOp,
    /// Command returns data: reject with "not implemented".
    Reject,
}

macro_rules! operations {
    ($($variant:ident => $name:literal, $returns:literal;)+) => {
        /// A host-visible bridge command.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum Operation {
            $($variant),+
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant),+];

            /// Host wire name (`searchPlaces`, `startTrip`, ...).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Operation::$variant => $name),+
                }
            }

            /// Whether the command resolves with a result payload.
            pub fn returns_value(&self) -> bool {
                match self {
                    $(Operation::$variant => $returns),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Operation::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

operations! {
    Initialize => "initialize", false;
    SetLogLevel => "setLogLevel", false;
    SetUserId => "setUserId", false;
    GetUserId => "getUserId", true;
    SetDescription => "setDescription", false;
    GetDescription => "getDescription", true;
    SetMetadata => "setMetadata", false;
    GetMetadata => "getMetadata", true;
    SetAnonymousTrackingEnabled => "setAnonymousTrackingEnabled", false;
    GetLocationPermissionsStatus => "getLocationPermissionsStatus", true;
    RequestLocationPermissions => "requestLocationPermissions", false;
    GetLocation => "getLocation", true;
    TrackOnce => "trackOnce", true;
    TrackVerified => "trackVerified", true;
    GetVerifiedLocationToken => "getVerifiedLocationToken", true;
    StartTrackingVerified => "startTrackingVerified", false;
    StopTrackingVerified => "stopTrackingVerified", false;
    StartTrackingEfficient => "startTrackingEfficient", false;
    StartTrackingResponsive => "startTrackingResponsive", false;
    StartTrackingContinuous => "startTrackingContinuous", false;
    StartTrackingCustom => "startTrackingCustom", false;
    MockTracking => "mockTracking", false;
    StopTracking => "stopTracking", false;
    IsTracking => "isTracking", true;
    GetTrackingOptions => "getTrackingOptions", true;
    SetForegroundServiceOptions => "setForegroundServiceOptions", false;
    StartTrip => "startTrip", true;
    UpdateTrip => "updateTrip", true;
    CompleteTrip => "completeTrip", true;
    CancelTrip => "cancelTrip", true;
    GetTripOptions => "getTripOptions", true;
    AcceptEvent => "acceptEvent", false;
    RejectEvent => "rejectEvent", false;
    GetContext => "getContext", true;
    SearchPlaces => "searchPlaces", true;
    SearchGeofences => "searchGeofences", true;
    Autocomplete => "autocomplete", true;
    Geocode => "geocode", true;
    ReverseGeocode => "reverseGeocode", true;
    IpGeocode => "ipGeocode", true;
    GetDistance => "getDistance", true;
    GetMatrix => "getMatrix", true;
    ValidateAddress => "validateAddress", true;
    LogConversion => "logConversion", true;
}

impl Operation {
    pub fn unsupported_policy(&self) -> UnsupportedPolicy {
        if self.returns_value() {
            UnsupportedPolicy::Reject
        } else {
            UnsupportedPolicy::NoOp
        }
    }

    /// Commands answered from bridge state without consulting the SDK.
    pub fn is_bridge_local(&self) -> bool {
        matches!(self, Operation::GetTripOptions)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves_back() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.as_str()), Some(*op));
        }
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert_eq!(Operation::from_name("searchPlaces"), Some(Operation::SearchPlaces));
        assert_eq!(Operation::from_name("SearchPlaces"), None);
        assert_eq!(Operation::from_name("searchPoints"), None);
    }

    #[test]
    fn test_unsupported_policy_follows_return_shape() {
        assert_eq!(
            Operation::StopTracking.unsupported_policy(),
            UnsupportedPolicy::NoOp
        );
        assert_eq!(
            Operation::SearchPlaces.unsupported_policy(),
            UnsupportedPolicy::Reject
        );
        assert_eq!(
            Operation::StartTrip.unsupported_policy(),
            UnsupportedPolicy::Reject
        );
    }
}
