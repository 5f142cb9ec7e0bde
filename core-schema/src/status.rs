//! Status Taxonomy
//!
//! Maps the native SDK's raw status tokens, authorization states and
//! location sources onto the closed canonical sets hosts program against.

use bridge_traits::native::{NativeAuthorization, NativeLocationSource, NativeLogLevel, NativeStatus};

use crate::enums::string_enum;

string_enum! {
    /// Canonical outcome of a native operation.
    ///
    /// Anything the table does not recognise is `ErrorUnknown`; a status is
    /// never assumed to be a success.
    pub enum Status {
        Success => "SUCCESS",
        ErrorPublishableKey => "ERROR_PUBLISHABLE_KEY",
        ErrorPermissions => "ERROR_PERMISSIONS",
        ErrorLocation => "ERROR_LOCATION",
        ErrorNetwork => "ERROR_NETWORK",
        ErrorUnauthorized => "ERROR_UNAUTHORIZED",
        ErrorRateLimit => "ERROR_RATE_LIMIT",
        ErrorServer => "ERROR_SERVER",
        ErrorUnknown => "ERROR_UNKNOWN",
    }
    fallback = ErrorUnknown;
}

impl Status {
    pub fn from_native(status: &NativeStatus) -> Self {
        Status::parse(status.as_str())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

string_enum! {
    pub enum PermissionsStatus {
        Denied => "DENIED",
        GrantedForeground => "GRANTED_FOREGROUND",
        GrantedBackground => "GRANTED_BACKGROUND",
        Unknown => "UNKNOWN",
    }
    fallback = Unknown;
}

impl PermissionsStatus {
    pub fn from_native(authorization: NativeAuthorization) -> Self {
        match authorization {
            NativeAuthorization::AuthorizedAlways => PermissionsStatus::GrantedBackground,
            NativeAuthorization::AuthorizedWhenInUse => PermissionsStatus::GrantedForeground,
            NativeAuthorization::Denied | NativeAuthorization::Restricted => {
                PermissionsStatus::Denied
            }
            NativeAuthorization::NotDetermined | NativeAuthorization::Unavailable => {
                PermissionsStatus::Unknown
            }
        }
    }
}

string_enum! {
    /// What produced a client location update.
    pub enum LocationSource {
        ForegroundLocation => "FOREGROUND_LOCATION",
        BackgroundLocation => "BACKGROUND_LOCATION",
        ManualLocation => "MANUAL_LOCATION",
        VisitArrival => "VISIT_ARRIVAL",
        VisitDeparture => "VISIT_DEPARTURE",
        GeofenceEnter => "GEOFENCE_ENTER",
        GeofenceDwell => "GEOFENCE_DWELL",
        GeofenceExit => "GEOFENCE_EXIT",
        MockLocation => "MOCK_LOCATION",
        BeaconEnter => "BEACON_ENTER",
        BeaconExit => "BEACON_EXIT",
        Unknown => "UNKNOWN",
    }
    fallback = Unknown;
}

impl LocationSource {
    pub fn from_native(source: NativeLocationSource) -> Self {
        match source {
            NativeLocationSource::ForegroundLocation => LocationSource::ForegroundLocation,
            NativeLocationSource::BackgroundLocation => LocationSource::BackgroundLocation,
            NativeLocationSource::ManualLocation => LocationSource::ManualLocation,
            NativeLocationSource::VisitArrival => LocationSource::VisitArrival,
            NativeLocationSource::VisitDeparture => LocationSource::VisitDeparture,
            NativeLocationSource::GeofenceEnter => LocationSource::GeofenceEnter,
            NativeLocationSource::GeofenceDwell => LocationSource::GeofenceDwell,
            NativeLocationSource::GeofenceExit => LocationSource::GeofenceExit,
            NativeLocationSource::MockLocation => LocationSource::MockLocation,
            NativeLocationSource::BeaconEnter => LocationSource::BeaconEnter,
            NativeLocationSource::BeaconExit => LocationSource::BeaconExit,
            NativeLocationSource::Unknown => LocationSource::Unknown,
        }
    }
}

string_enum! {
    /// Verbosity of the native SDK's own logging.
    pub enum SdkLogLevel {
        None => "none",
        Error => "error",
        Warning => "warning" | "warn",
        Info => "info",
        Debug => "debug",
    }
}

impl SdkLogLevel {
    pub fn to_native(self) -> NativeLogLevel {
        match self {
            SdkLogLevel::None => NativeLogLevel::None,
            SdkLogLevel::Error => NativeLogLevel::Error,
            SdkLogLevel::Warning => NativeLogLevel::Warning,
            SdkLogLevel::Info => NativeLogLevel::Info,
            SdkLogLevel::Debug => NativeLogLevel::Debug,
        }
    }
}
