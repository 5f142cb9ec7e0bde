//! Delegate emission and completion bridging against the simulated SDK.

use bridge_sim::{CompletionMode, SimulatedSdk};
use bridge_traits::native::{
    JsonObject, NativeDesiredAccuracy, NativeLocation, NativeLocationSource, NativeStatus,
};
use bridge_traits::sdk::{LocationSdk, NativeReceiver};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Default)]
struct RecordingReceiver {
    seen: Mutex<Vec<String>>,
}

impl RecordingReceiver {
    fn push(&self, entry: impl Into<String>) {
        self.seen.lock().unwrap().push(entry.into());
    }
}

impl NativeReceiver for RecordingReceiver {
    fn on_events_received(&self, events: Vec<JsonObject>, _user: Option<JsonObject>) {
        self.push(format!("events:{}", events.len()));
    }

    fn on_location_updated(&self, location: NativeLocation, _user: JsonObject) {
        self.push(format!("location:{}", location.latitude));
    }

    fn on_client_location_updated(
        &self,
        _location: NativeLocation,
        stopped: bool,
        _source: NativeLocationSource,
    ) {
        self.push(format!("clientLocation:{}", stopped));
    }

    fn on_error(&self, status: NativeStatus) {
        self.push(format!("error:{}", status));
    }

    fn on_log(&self, message: String) {
        self.push(format!("log:{}", message));
    }

    fn on_token_updated(&self, _token: JsonObject) {
        self.push("token");
    }
}

#[test]
fn test_emissions_reach_the_single_receiver() {
    let sdk = SimulatedSdk::new();
    let first = Arc::new(RecordingReceiver::default());
    let second = Arc::new(RecordingReceiver::default());

    sdk.set_receiver(first.clone());
    sdk.set_receiver(second.clone());
    assert_eq!(sdk.receiver_registrations(), 2);

    sdk.emit_log("hello");
    sdk.emit_error("ERROR_NETWORK");
    sdk.emit_events(vec![JsonObject::new()], None);
    sdk.emit_client_location(
        NativeLocation::at(1.0, 2.0),
        true,
        NativeLocationSource::ForegroundLocation,
    );

    assert!(first.seen.lock().unwrap().is_empty());
    assert_eq!(
        *second.seen.lock().unwrap(),
        vec![
            "log:hello",
            "error:ERROR_NETWORK",
            "events:1",
            "clientLocation:true"
        ]
    );
}

#[test]
fn test_emission_without_receiver_is_ignored() {
    let sdk = SimulatedSdk::new();
    sdk.emit_log("nobody listening");
    assert_eq!(sdk.call_count(), 0);
}

#[tokio::test]
async fn test_threaded_completion_resolves_oneshot() {
    let sdk = SimulatedSdk::new();
    sdk.set_completion_mode(CompletionMode::Threaded);

    let (tx, rx) = oneshot::channel();
    sdk.get_location(
        NativeDesiredAccuracy::Medium,
        Box::new(move |reply| {
            let _ = tx.send(reply);
        }),
    );

    let reply = rx.await.unwrap();
    assert_eq!(reply.status, NativeStatus::success());
    assert_eq!(sdk.calls_named("getLocation").len(), 1);
}
