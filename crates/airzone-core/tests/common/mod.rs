// Scripted in-memory transport shared by the core integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use airzone_api::{ApiRequest, Error, Response, Transport};
use airzone_core::{CacheStore, Client, TtlPolicy};
use serde_json::{Value, json};

/// Answers reads from a table keyed by request, records every call, and
/// fails requests marked as failing with HTTP 500.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, Value>>,
    failing: Mutex<Vec<String>>,
    calls: Mutex<Vec<ApiRequest>>,
}

fn request_key(request: &ApiRequest) -> String {
    format!("{} {}", request.endpoint, Value::Object(request.params.clone()))
}

impl FakeTransport {
    pub fn respond(&self, request: &ApiRequest, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(request_key(request), body);
    }

    pub fn fail(&self, request: &ApiRequest) {
        self.failing.lock().unwrap().push(request_key(request));
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, request: &ApiRequest) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == request)
            .count()
    }
}

impl Transport for FakeTransport {
    fn host(&self) -> &str {
        "fake.local"
    }

    fn port(&self) -> u16 {
        3000
    }

    async fn request(&self, request: &ApiRequest) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(request.clone());
        let key = request_key(request);

        if self.failing.lock().unwrap().contains(&key) {
            return Err(Error::Status {
                status: 500,
                body: "scripted failure".into(),
            });
        }
        if request.method.is_write() {
            return Ok(Response {
                status: 200,
                body: json!({ "data": [request.params] }),
            });
        }
        match self.responses.lock().unwrap().get(&key) {
            Some(body) => Ok(Response {
                status: 200,
                body: body.clone(),
            }),
            None => Err(Error::Status {
                status: 404,
                body: format!("no scripted response for {key}"),
            }),
        }
    }
}

/// The reference device: systems 1 and 2, zone 1 of system 1 on at
/// 22.5 °C in mode 2 with an IAQ sensor fitted (sensor 1/1), one zone in
/// system 2 without sensors.
pub fn scripted_device() -> FakeTransport {
    let t = FakeTransport::default();
    t.respond(
        &ApiRequest::webserver(),
        json!({ "mac": "AA:BB:CC:DD:EE:FF", "alias": "Casa", "ws_firmware": "3.44", "interface": "wifi" }),
    );
    t.respond(&ApiRequest::version(), json!({ "version": "1.62" }));
    t.respond(
        &ApiRequest::all_systems(),
        json!({ "systems": [
            { "systemID": 1, "manufacturer": "Daikin", "errors": [] },
            { "systemID": 2, "manufacturer": "Daikin", "errors": [] }
        ] }),
    );
    t.respond(
        &ApiRequest::zones(1),
        json!({ "data": [
            { "systemID": 1, "zoneID": 1, "name": "Salon", "on": 1, "setpoint": 22.5, "mode": 2, "roomTemp": 21.8 }
        ] }),
    );
    t.respond(
        &ApiRequest::zones(2),
        json!({ "data": [
            { "systemID": 2, "zoneID": 1, "name": "Office", "on": 0, "setpoint": 20, "mode": 1 }
        ] }),
    );
    t.respond(
        &ApiRequest::zone(1, 1),
        json!({ "data": [
            { "systemID": 1, "zoneID": 1, "name": "Salon", "on": 1, "setpoint": 22.5, "mode": 2 }
        ] }),
    );
    t.respond(
        &ApiRequest::iaq_sensors(1),
        json!({ "data": [
            { "iaqsensorid": 1, "name": "Salon IAQ", "iaq_mode_vent": 1, "co2_value": 640 }
        ] }),
    );
    t.respond(&ApiRequest::iaq_sensors(2), json!({ "data": [] }));
    t
}

pub fn cached_client(transport: FakeTransport, dir: &std::path::Path) -> Client<FakeTransport> {
    let cache = CacheStore::open(dir).unwrap();
    Client::new(transport, Some(cache), TtlPolicy::default())
}
