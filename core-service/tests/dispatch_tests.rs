//! Host dispatch against the simulated SDK.

use std::sync::Arc;

use bridge_sim::{CompletionMode, SimulatedSdk};
use bridge_traits::Operation;
use core_runtime::config::BridgeConfig;
use core_schema::Status;
use core_service::LocationBridge;
use serde_json::{json, Value};

fn bridge() -> (LocationBridge, Arc<SimulatedSdk>) {
    let sdk = Arc::new(SimulatedSdk::new());
    let config = BridgeConfig::builder().sdk(sdk.clone()).build().unwrap();
    (LocationBridge::new(config).unwrap(), sdk)
}

#[tokio::test]
async fn test_unknown_command_is_rejected_without_native_calls() {
    let (bridge, sdk) = bridge();

    let rejection = bridge.call("startTrackingFast", Value::Null).await.unwrap_err();
    assert_eq!(rejection.code, "UNKNOWN_COMMAND");
    assert!(rejection.status.is_none());

    let rejection = bridge.call("TRACKONCE", Value::Null).await.unwrap_err();
    assert_eq!(rejection.code, "UNKNOWN_COMMAND");
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_non_object_arguments_are_rejected() {
    let (bridge, sdk) = bridge();

    let rejection = bridge.call("setUserId", json!(["u1"])).await.unwrap_err();
    assert_eq!(rejection.code, "INVALID_ARGUMENTS");
    assert_eq!(sdk.call_count(), 0);

    // Null stands for "no arguments".
    assert_eq!(bridge.call("stopTracking", Value::Null).await.unwrap(), Value::Null);
    assert_eq!(sdk.calls_named("stopTracking").len(), 1);
}

#[tokio::test]
async fn test_initialize_requires_publishable_key() {
    let (bridge, sdk) = bridge();

    let rejection = bridge.call("initialize", json!({})).await.unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");
    assert_eq!(sdk.call_count(), 0);

    bridge
        .call("initialize", json!({"publishableKey": "prj_test_pk_123"}))
        .await
        .unwrap();
    assert_eq!(sdk.publishable_key().as_deref(), Some("prj_test_pk_123"));
}

#[tokio::test]
async fn test_identity_round_trip() {
    let (bridge, _sdk) = bridge();

    bridge.call("setUserId", json!({"userId": "u1"})).await.unwrap();
    let result = bridge.call("getUserId", Value::Null).await.unwrap();
    assert_eq!(result, json!({"userId": "u1"}));

    bridge
        .call("setDescription", json!({"description": "courier"}))
        .await
        .unwrap();
    let result = bridge.call("getDescription", Value::Null).await.unwrap();
    assert_eq!(result, json!({"description": "courier"}));

    bridge
        .call("setMetadata", json!({"metadata": {"tier": "gold"}}))
        .await
        .unwrap();
    let result = bridge.call("getMetadata", Value::Null).await.unwrap();
    assert_eq!(result["metadata"]["tier"], "gold");

    bridge.call("setUserId", json!({})).await.unwrap();
    let result = bridge.call("getUserId", Value::Null).await.unwrap();
    assert_eq!(result, json!({"userId": null}));
}

#[tokio::test]
async fn test_set_log_level_rejects_unknown_level() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call("setLogLevel", json!({"level": "verbose"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
    assert_eq!(sdk.call_count(), 0);

    bridge.call("setLogLevel", json!({"level": "debug"})).await.unwrap();
    assert_eq!(
        sdk.log_level(),
        bridge_traits::native::NativeLogLevel::Debug
    );
}

#[tokio::test]
async fn test_anonymous_tracking_requires_flag() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call("setAnonymousTrackingEnabled", json!({}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");

    bridge
        .call("setAnonymousTrackingEnabled", json!({"enabled": true}))
        .await
        .unwrap();
    assert!(sdk.anonymous_tracking());
}

#[tokio::test]
async fn test_get_location_normalizes_reply() {
    let (bridge, _sdk) = bridge();

    let result = bridge.call("getLocation", Value::Null).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["location"]["latitude"], 40.783826);
    assert_eq!(result["location"]["longitude"], -73.975363);
    assert_eq!(result["location"]["accuracy"], 65.0);
}

#[tokio::test]
async fn test_unknown_desired_accuracy_falls_back_to_medium() {
    let (bridge, sdk) = bridge();

    bridge
        .call("getLocation", json!({"desiredAccuracy": "extreme"}))
        .await
        .unwrap();
    let calls = sdk.calls_named("getLocation");
    assert_eq!(calls[0].args["desiredAccuracy"], "Medium");

    bridge
        .call("getLocation", json!({"desiredAccuracy": "HIGH"}))
        .await
        .unwrap();
    let calls = sdk.calls_named("getLocation");
    assert_eq!(calls[1].args["desiredAccuracy"], "High");
}

#[tokio::test]
async fn test_track_once_selects_overload() {
    let (bridge, sdk) = bridge();

    bridge.call("trackOnce", Value::Null).await.unwrap();
    assert_eq!(sdk.calls_named("trackOnce").len(), 1);
    assert!(sdk.calls_named("trackOnceAt").is_empty());

    let result = bridge
        .call(
            "trackOnce",
            json!({"latitude": 40.7, "longitude": -74.0, "accuracy": 12.0}),
        )
        .await
        .unwrap();
    let calls = sdk.calls_named("trackOnceAt");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args["location"]["latitude"], 40.7);
    assert_eq!(calls[0].args["location"]["horizontal_accuracy"], 12.0);
    assert_eq!(result["status"], "SUCCESS");
}

#[tokio::test]
async fn test_track_once_native_failure_carries_status() {
    let (bridge, sdk) = bridge();
    sdk.script_status("trackOnce", "errorLocation");

    let rejection = bridge.call("trackOnce", Value::Null).await.unwrap_err();
    assert_eq!(rejection.code, "NATIVE_ERROR");
    assert_eq!(rejection.status, Some(Status::ErrorLocation));

    let rendered = serde_json::to_value(&rejection).unwrap();
    assert_eq!(rendered["status"], "ERROR_LOCATION");
}

#[tokio::test]
async fn test_unrecognized_native_status_becomes_error_unknown() {
    let (bridge, sdk) = bridge();
    sdk.script_status("ipGeocode", "ERROR_SOMETHING_NEW");

    let rejection = bridge.call("ipGeocode", Value::Null).await.unwrap_err();
    assert_eq!(rejection.status, Some(Status::ErrorUnknown));
}

#[tokio::test]
async fn test_invalid_coordinate_makes_no_native_call() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call(
            "searchPlaces",
            json!({"near": {"latitude": 140.0, "longitude": 0.0}, "categories": ["food"]}),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");

    let rejection = bridge
        .call("trackOnce", json!({"latitude": 40.0}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");

    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_search_places_selects_overload() {
    let (bridge, sdk) = bridge();

    bridge
        .call("searchPlaces", json!({"categories": ["coffee-shop"]}))
        .await
        .unwrap();
    let calls = sdk.calls_named("searchPlaces");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args["radius"], 1000);
    assert_eq!(calls[0].args["limit"], 10);
    assert!(sdk.calls_named("searchPlacesNear").is_empty());

    let result = bridge
        .call(
            "searchPlaces",
            json!({
                "near": {"latitude": 40.78, "longitude": -73.97},
                "radius": 500,
                "chains": ["starbucks"],
                "limit": 5
            }),
        )
        .await
        .unwrap();
    let calls = sdk.calls_named("searchPlacesNear");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args["near"]["horizontal_accuracy"], 5.0);
    assert_eq!(calls[0].args["search"]["radius"], 500);
    assert_eq!(calls[0].args["search"]["limit"], 5);
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["places"], json!([]));
}

#[tokio::test]
async fn test_search_geofences_selects_overload() {
    let (bridge, sdk) = bridge();

    bridge.call("searchGeofences", Value::Null).await.unwrap();
    bridge
        .call(
            "searchGeofences",
            json!({"near": {"latitude": 40.78, "longitude": -73.97}, "tags": ["store"]}),
        )
        .await
        .unwrap();

    assert_eq!(sdk.calls_named("searchGeofences").len(), 1);
    assert_eq!(sdk.calls_named("searchGeofencesNear").len(), 1);
}

#[tokio::test]
async fn test_search_limits_are_validated() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call("searchPlaces", json!({"limit": 0}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");

    let rejection = bridge
        .call("searchGeofences", json!({"radius": -5}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_get_distance_selects_overload() {
    let (bridge, sdk) = bridge();
    let destination = json!({"latitude": 40.70, "longitude": -73.99});

    let result = bridge
        .call(
            "getDistance",
            json!({"destination": destination, "modes": ["car", "foot"], "units": "metric"}),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(sdk.calls_named("getDistance").len(), 1);
    assert!(sdk.calls_named("getDistanceFrom").is_empty());

    bridge
        .call(
            "getDistance",
            json!({
                "origin": {"latitude": 40.78, "longitude": -73.97},
                "destination": destination,
                "modes": ["car"],
                "units": "imperial"
            }),
        )
        .await
        .unwrap();
    let calls = sdk.calls_named("getDistanceFrom");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args["origin"]["horizontal_accuracy"], 5.0);
}

#[tokio::test]
async fn test_get_distance_validation() {
    let (bridge, sdk) = bridge();
    let destination = json!({"latitude": 40.70, "longitude": -73.99});

    let rejection = bridge
        .call("getDistance", json!({"destination": destination, "units": "metric"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");

    let rejection = bridge
        .call(
            "getDistance",
            json!({"destination": destination, "modes": ["car"], "units": "furlongs"}),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");

    let rejection = bridge
        .call(
            "getDistance",
            json!({"destination": destination, "modes": ["hovercraft"], "units": "metric"}),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_get_matrix_requires_locations() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call(
            "getMatrix",
            json!({
                "origins": [],
                "destinations": [{"latitude": 40.70, "longitude": -73.99}],
                "mode": "car",
                "units": "metric"
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
    assert_eq!(sdk.call_count(), 0);

    let result = bridge
        .call(
            "getMatrix",
            json!({
                "origins": [{"latitude": 40.78, "longitude": -73.97}],
                "destinations": [
                    {"latitude": 40.70, "longitude": -73.99},
                    {"latitude": 40.73, "longitude": -73.93}
                ],
                "mode": "car",
                "units": "metric"
            }),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(sdk.calls_named("getMatrix").len(), 1);
}

#[tokio::test]
async fn test_reverse_geocode_and_context_select_overload() {
    let (bridge, sdk) = bridge();

    bridge.call("reverseGeocode", Value::Null).await.unwrap();
    bridge
        .call(
            "reverseGeocode",
            json!({"location": {"latitude": 40.78, "longitude": -73.97}, "layers": ["address"]}),
        )
        .await
        .unwrap();
    assert_eq!(sdk.calls_named("reverseGeocode").len(), 1);
    assert_eq!(sdk.calls_named("reverseGeocodeAt").len(), 1);

    bridge.call("getContext", Value::Null).await.unwrap();
    let result = bridge
        .call("getContext", json!({"latitude": 40.78, "longitude": -73.97}))
        .await
        .unwrap();
    assert_eq!(sdk.calls_named("getContext").len(), 1);
    assert_eq!(sdk.calls_named("getContextAt").len(), 1);
    assert_eq!(result["status"], "SUCCESS");
}

#[tokio::test]
async fn test_geocode_requires_query() {
    let (bridge, sdk) = bridge();

    let rejection = bridge.call("geocode", json!({"query": ""})).await.unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");
    assert_eq!(sdk.call_count(), 0);

    let result = bridge
        .call("geocode", json!({"query": "20 Jay St Brooklyn"}))
        .await
        .unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["addresses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_accept_event_without_verified_place() {
    let (bridge, sdk) = bridge();

    bridge.call("acceptEvent", json!({"eventId": "evt-1"})).await.unwrap();
    bridge
        .call("acceptEvent", json!({"eventId": "evt-2", "verifiedPlaceId": "place-9"}))
        .await
        .unwrap();
    bridge.call("rejectEvent", json!({"eventId": "evt-3"})).await.unwrap();

    let calls = sdk.calls_named("acceptEvent");
    assert_eq!(calls[0].args, json!({"eventId": "evt-1", "verifiedPlaceId": null}));
    assert_eq!(calls[1].args["verifiedPlaceId"], "place-9");
    assert_eq!(sdk.calls_named("rejectEvent")[0].args["eventId"], "evt-3");

    let rejection = bridge.call("rejectEvent", json!({})).await.unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");
}

#[tokio::test]
async fn test_custom_tracking_options_round_trip() {
    let (bridge, _sdk) = bridge();

    bridge
        .call(
            "startTrackingCustom",
            json!({"options": {
                "desiredStoppedUpdateInterval": 180,
                "desiredMovingUpdateInterval": 30,
                "desiredAccuracy": "high",
                "stopDistance": 70,
                "beacons": true
            }}),
        )
        .await
        .unwrap();

    let result = bridge.call("isTracking", Value::Null).await.unwrap();
    assert_eq!(result, json!({"isTracking": true}));

    let options = bridge.call("getTrackingOptions", Value::Null).await.unwrap();
    assert_eq!(options["desiredStoppedUpdateInterval"], 180);
    assert_eq!(options["desiredMovingUpdateInterval"], 30);
    assert_eq!(options["desiredAccuracy"], "high");
    assert_eq!(options["stopDistance"], 70);
    assert_eq!(options["beacons"], true);

    bridge.call("stopTracking", Value::Null).await.unwrap();
    let result = bridge.call("isTracking", Value::Null).await.unwrap();
    assert_eq!(result, json!({"isTracking": false}));
}

#[tokio::test]
async fn test_verified_tracking_uses_default_interval() {
    let (bridge, sdk) = bridge();

    bridge.call("startTrackingVerified", json!({"beacons": true})).await.unwrap();
    assert!(sdk.is_tracking_verified());
    let call = &sdk.calls_named("startTrackingVerified")[0];
    assert!(call.args["interval"].as_i64().unwrap() > 0);
    assert_eq!(call.args["beacons"], true);

    let rejection = bridge
        .call("startTrackingVerified", json!({"interval": 0}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");

    bridge.call("stopTrackingVerified", Value::Null).await.unwrap();
    assert!(!sdk.is_tracking_verified());
}

#[tokio::test]
async fn test_track_verified_returns_token() {
    let (bridge, sdk) = bridge();

    let result = bridge.call("trackVerified", Value::Null).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert!(result["token"].is_object());
    assert_eq!(sdk.calls_named("trackVerified")[0].args["beacons"], false);
}

#[tokio::test]
async fn test_mock_tracking_resolves_immediately() {
    let (bridge, sdk) = bridge();

    let result = bridge
        .call(
            "mockTracking",
            json!({
                "origin": {"latitude": 40.78, "longitude": -73.97},
                "destination": {"latitude": 40.70, "longitude": -73.99},
                "mode": "car",
                "steps": 3,
                "interval": 1
            }),
        )
        .await
        .unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(sdk.calls_named("mockTracking").len(), 1);

    let rejection = bridge
        .call(
            "mockTracking",
            json!({
                "origin": {"latitude": 40.78, "longitude": -73.97},
                "destination": {"latitude": 40.70, "longitude": -73.99},
                "mode": "unknown"
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
    assert_eq!(sdk.calls_named("mockTracking").len(), 1);
}

#[tokio::test]
async fn test_permissions_follow_requests() {
    let (bridge, _sdk) = bridge();

    let result = bridge
        .call("getLocationPermissionsStatus", Value::Null)
        .await
        .unwrap();
    assert_eq!(result["status"], "UNKNOWN");

    bridge
        .call("requestLocationPermissions", json!({"background": true}))
        .await
        .unwrap();
    let result = bridge
        .call("getLocationPermissionsStatus", Value::Null)
        .await
        .unwrap();
    assert_eq!(result["status"], "GRANTED_BACKGROUND");
}

#[tokio::test]
async fn test_validate_address_and_conversion() {
    let (bridge, sdk) = bridge();

    let result = bridge
        .call(
            "validateAddress",
            json!({"address": {
                "addressLabel": "20 Jay St",
                "city": "Brooklyn",
                "stateCode": "NY",
                "postalCode": "11201",
                "countryCode": "US"
            }}),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["verificationStatus"], "verified");

    let result = bridge
        .call(
            "logConversion",
            json!({"name": "checkout", "revenue": 12.5, "metadata": {"sku": "A1"}}),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(sdk.calls_named("logConversion")[0].args["name"], "checkout");

    let rejection = bridge.call("logConversion", json!({})).await.unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");
}

#[tokio::test]
async fn test_unsupported_fire_and_forget_is_a_no_op() {
    let (bridge, sdk) = bridge();
    sdk.mark_unsupported(Operation::SetForegroundServiceOptions);

    let result = bridge
        .call(
            "setForegroundServiceOptions",
            json!({"options": {"text": "Tracking", "importance": 2}}),
        )
        .await
        .unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_unsupported_value_command_rejects_before_validation() {
    let (bridge, sdk) = bridge();
    sdk.mark_unsupported(Operation::Geocode);

    let rejection = bridge.call("geocode", json!({})).await.unwrap_err();
    assert_eq!(rejection.code, "NOT_IMPLEMENTED");
    assert!(rejection.status.is_none());
    assert!(rejection.message.contains("geocode"));
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_trip_options_answer_even_when_sdk_lacks_commands() {
    let (bridge, sdk) = bridge();
    sdk.mark_unsupported(Operation::GetTripOptions);

    let result = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(result, json!({"options": null}));
}

#[tokio::test]
async fn test_dropped_completion_rejects() {
    let (bridge, sdk) = bridge();
    sdk.drop_completions("getLocation");

    let rejection = bridge.call("getLocation", Value::Null).await.unwrap_err();
    assert_eq!(rejection.code, "CALLBACK_DROPPED");
    assert_eq!(rejection.status, Some(Status::ErrorUnknown));

    sdk.clear_script("getLocation");
    assert!(bridge.call("getLocation", Value::Null).await.is_ok());
}

#[tokio::test]
async fn test_threaded_completion_resolves() {
    let (bridge, sdk) = bridge();
    sdk.set_completion_mode(CompletionMode::Threaded);

    let result = bridge.call("getLocation", Value::Null).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");

    let result = bridge
        .call("searchPlaces", json!({"near": {"latitude": 1.0, "longitude": 2.0}}))
        .await
        .unwrap();
    assert_eq!(result["location"]["latitude"], 1.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_commands_resolve_independently() {
    let (bridge, sdk) = bridge();
    sdk.set_completion_mode(CompletionMode::Threaded);
    let bridge = Arc::new(bridge);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move { bridge.call("getLocation", Value::Null).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(sdk.calls_named("getLocation").len(), 8);
}
