//! Trip commands end to end against the simulated SDK.

use std::sync::Arc;

use bridge_sim::{CompletionMode, SimulatedSdk};
use bridge_traits::native::NativeTripStatus;
use bridge_traits::JsonObject;
use core_runtime::config::BridgeConfig;
use core_schema::{Status, TripOptions, TripStatus};
use core_service::requests::StartTripRequest;
use core_service::LocationBridge;
use serde_json::{json, Value};

fn bridge() -> (LocationBridge, Arc<SimulatedSdk>) {
    let sdk = Arc::new(SimulatedSdk::new());
    let config = BridgeConfig::builder().sdk(sdk.clone()).build().unwrap();
    (LocationBridge::new(config).unwrap(), sdk)
}

fn trip_event(id: &str, event_type: &str, external_id: &str, status: &str) -> JsonObject {
    match json!({
        "_id": id,
        "type": event_type,
        "trip": {"externalId": external_id, "status": status}
    }) {
        Value::Object(object) => object,
        _ => unreachable!(),
    }
}

fn trip_args(external_id: &str) -> Value {
    json!({
        "tripOptions": {
            "externalId": external_id,
            "destinationGeofenceTag": "store",
            "destinationGeofenceExternalId": "123",
            "mode": "car"
        }
    })
}

#[tokio::test]
async fn test_start_trip_records_active_trip() {
    let (bridge, sdk) = bridge();

    let result = bridge.call("startTrip", trip_args("t1")).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["trip"]["externalId"], "t1");
    assert_eq!(result["trip"]["status"], "started");
    assert_eq!(result["events"].as_array().unwrap().len(), 1);

    assert_eq!(bridge.trip_status().await, TripStatus::Started);
    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options["options"]["externalId"], "t1");
    assert_eq!(options["options"]["destinationGeofenceTag"], "store");

    assert_eq!(
        sdk.active_trip(),
        Some(("t1".to_string(), NativeTripStatus::Started))
    );
}

#[tokio::test]
async fn test_start_trip_accepts_every_argument_shape() {
    let (bridge, sdk) = bridge();

    // Flat options.
    bridge
        .call("startTrip", json!({"options": {"externalId": "flat"}}))
        .await
        .unwrap();
    bridge.call("completeTrip", Value::Null).await.unwrap();

    // Nested under options, with tracking options.
    bridge
        .call(
            "startTrip",
            json!({"options": {
                "tripOptions": {"externalId": "nested"},
                "trackingOptions": {"desiredAccuracy": "high", "desiredMovingUpdateInterval": 20}
            }}),
        )
        .await
        .unwrap();
    let calls = sdk.calls_named("startTrip");
    assert_eq!(calls[1].args["options"]["external_id"], "nested");
    assert!(calls[1].args["trackingOptions"].is_object());
    assert_eq!(calls[0].args["trackingOptions"], Value::Null);
    bridge.call("cancelTrip", Value::Null).await.unwrap();

    // Top-level tripOptions win over options.
    bridge
        .call(
            "startTrip",
            json!({
                "tripOptions": {"externalId": "top"},
                "options": {"externalId": "ignored"}
            }),
        )
        .await
        .unwrap();
    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options["options"]["externalId"], "top");
}

#[tokio::test]
async fn test_start_trip_validation_makes_no_native_call() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call("startTrip", json!({"tripOptions": {"mode": "car"}}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");

    let rejection = bridge
        .call(
            "startTrip",
            json!({"tripOptions": {"externalId": "t1", "approachingThreshold": -1}}),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");

    let rejection = bridge.call("startTrip", json!({})).await.unwrap_err();
    assert_eq!(rejection.code, "MISSING_FIELD");

    assert_eq!(sdk.call_count(), 0);
    assert_eq!(bridge.trip_status().await, TripStatus::Unknown);
}

#[tokio::test]
async fn test_start_while_active_fails_and_keeps_trip() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    let rejection = bridge.call("startTrip", trip_args("t2")).await.unwrap_err();
    assert_eq!(rejection.code, "TRIP_ALREADY_ACTIVE");
    assert!(rejection.message.contains("t1"));
    assert_eq!(sdk.calls_named("startTrip").len(), 1);

    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options["options"]["externalId"], "t1");
    assert_eq!(bridge.trip_status().await, TripStatus::Started);
}

#[tokio::test]
async fn test_replacement_allowed_when_configured() {
    let sdk = Arc::new(SimulatedSdk::new());
    let config = BridgeConfig::builder()
        .sdk(sdk.clone())
        .allow_trip_replacement(true)
        .build()
        .unwrap();
    let bridge = LocationBridge::new(config).unwrap();

    bridge.call("startTrip", trip_args("t1")).await.unwrap();
    bridge.call("startTrip", trip_args("t2")).await.unwrap();

    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options["options"]["externalId"], "t2");
    assert_eq!(sdk.calls_named("startTrip").len(), 2);
}

#[tokio::test]
async fn test_failed_start_leaves_no_trip() {
    let (bridge, sdk) = bridge();
    sdk.script_status("startTrip", "ERROR_NETWORK");

    let rejection = bridge.call("startTrip", trip_args("t1")).await.unwrap_err();
    assert_eq!(rejection.code, "NATIVE_ERROR");
    assert_eq!(rejection.status, Some(Status::ErrorNetwork));

    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options, json!({"options": null}));

    sdk.clear_script("startTrip");
    assert!(bridge.call("startTrip", trip_args("t1")).await.is_ok());
}

#[tokio::test]
async fn test_update_requires_matching_active_trip() {
    let (bridge, sdk) = bridge();

    let rejection = bridge
        .call("updateTrip", json!({"options": {"externalId": "t1"}, "status": "arrived"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "NO_ACTIVE_TRIP");

    bridge.call("startTrip", trip_args("t1")).await.unwrap();
    let rejection = bridge
        .call("updateTrip", json!({"options": {"externalId": "t2"}, "status": "arrived"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "TRIP_MISMATCH");
    assert!(sdk.calls_named("updateTrip").is_empty());
}

#[tokio::test]
async fn test_update_enforces_status_order() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    let result = bridge
        .call(
            "updateTrip",
            json!({"options": {"externalId": "t1", "destinationGeofenceTag": "store"}, "status": "arrived"}),
        )
        .await
        .unwrap();
    assert_eq!(result["trip"]["status"], "arrived");
    assert_eq!(bridge.trip_status().await, TripStatus::Arrived);

    let rejection = bridge
        .call("updateTrip", json!({"options": {"externalId": "t1"}, "status": "approaching"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_TRANSITION");
    assert_eq!(sdk.calls_named("updateTrip").len(), 1);

    let rejection = bridge
        .call("updateTrip", json!({"options": {"externalId": "t1"}, "status": "paused"}))
        .await
        .unwrap_err();
    assert_eq!(rejection.code, "INVALID_FIELD");
}

#[tokio::test]
async fn test_update_without_status_keeps_current() {
    let (bridge, _sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    let result = bridge
        .call(
            "updateTrip",
            json!({"options": {"externalId": "t1", "metadata": {"stop": 2}}}),
        )
        .await
        .unwrap();
    assert_eq!(result["trip"]["status"], "started");

    let options = bridge.call("getTripOptions", Value::Null).await.unwrap();
    assert_eq!(options["options"]["metadata"]["stop"], 2);
}

#[tokio::test]
async fn test_terminal_update_ends_trip() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    let result = bridge
        .call("updateTrip", json!({"options": {"externalId": "t1"}, "status": "expired"}))
        .await
        .unwrap();
    assert_eq!(result["trip"]["status"], "expired");
    assert_eq!(bridge.trip_status().await, TripStatus::Unknown);
    assert!(sdk.active_trip().is_none());

    bridge.call("startTrip", trip_args("t2")).await.unwrap();
}

#[tokio::test]
async fn test_complete_and_cancel_clear_trip() {
    let (bridge, sdk) = bridge();

    bridge.call("startTrip", trip_args("t1")).await.unwrap();
    let result = bridge.call("completeTrip", Value::Null).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["trip"]["externalId"], "t1");
    assert_eq!(result["trip"]["status"], "completed");
    assert_eq!(
        bridge.call("getTripOptions", Value::Null).await.unwrap(),
        json!({"options": null})
    );
    assert!(sdk.active_trip().is_none());

    bridge.call("startTrip", trip_args("t2")).await.unwrap();
    let result = bridge.call("cancelTrip", Value::Null).await.unwrap();
    assert_eq!(result["trip"]["status"], "canceled");
    assert_eq!(bridge.trip_status().await, TripStatus::Unknown);
}

#[tokio::test]
async fn test_complete_is_forwarded_without_a_trip() {
    let (bridge, sdk) = bridge();

    let result = bridge.call("completeTrip", Value::Null).await.unwrap();
    assert_eq!(result["status"], "SUCCESS");
    assert!(result.get("trip").is_none());
    assert_eq!(sdk.calls_named("completeTrip").len(), 1);
}

#[tokio::test]
async fn test_failed_complete_keeps_trip() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();
    sdk.script_status("completeTrip", "ERROR_SERVER");

    let rejection = bridge.call("completeTrip", Value::Null).await.unwrap_err();
    assert_eq!(rejection.status, Some(Status::ErrorServer));
    assert_eq!(bridge.trip_status().await, TripStatus::Started);
}

#[tokio::test]
async fn test_typed_start_trip() {
    let (bridge, _sdk) = bridge();

    let response = bridge
        .start_trip(StartTripRequest::new(TripOptions::new("typed")))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Success);
    let trip = response.trip.unwrap();
    assert_eq!(trip.external_id, "typed");
    assert_eq!(trip.status, TripStatus::Started);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_admit_one_trip() {
    let (bridge, sdk) = bridge();
    sdk.set_completion_mode(CompletionMode::Threaded);
    let bridge = Arc::new(bridge);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move { bridge.call("startTrip", trip_args(&format!("t{i}"))).await })
        })
        .collect();

    let mut started = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => started += 1,
            Err(rejection) => assert_eq!(rejection.code, "TRIP_ALREADY_ACTIVE"),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(sdk.calls_named("startTrip").len(), 1);
}

#[tokio::test]
async fn test_sdk_ended_trip_frees_the_active_slot() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    sdk.emit_events(
        vec![trip_event("evt-1", "user.stopped_trip", "t1", "expired")],
        None,
    );
    bridge.events().flush().await;

    assert_eq!(bridge.trip_status().await, TripStatus::Unknown);
    assert_eq!(
        bridge.call("getTripOptions", Value::Null).await.unwrap(),
        json!({"options": null})
    );
    let result = bridge.call("startTrip", trip_args("t2")).await.unwrap();
    assert_eq!(result["trip"]["externalId"], "t2");
    assert_eq!(bridge.trip_status().await, TripStatus::Started);
}

#[tokio::test]
async fn test_sdk_reported_progress_updates_status() {
    let (bridge, sdk) = bridge();
    bridge.call("startTrip", trip_args("t1")).await.unwrap();

    sdk.emit_events(
        vec![
            trip_event("evt-1", "user.arrived_at_trip_destination", "t1", "arrived"),
            trip_event("evt-2", "user.stopped_trip", "t9", "completed"),
        ],
        None,
    );
    bridge.events().flush().await;
    assert_eq!(bridge.trip_status().await, TripStatus::Arrived);

    let err = bridge
        .call(
            "updateTrip",
            json!({"options": {"externalId": "t1"}, "status": "approaching"}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_TRANSITION");
    assert_eq!(bridge.trip_status().await, TripStatus::Arrived);
}
