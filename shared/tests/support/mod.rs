#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use serde::Serialize;
use serde_json::json;

use driver_core::capabilities::{
    HttpRequest, HttpResponse, HttpResult, KeyValueOperation, KeyValueResponse, KeyValueResult,
    Value,
};
use driver_core::view::{ScreenView, ViewModel};
use driver_core::{App, Effect, Event, Model};

pub const API: &str = "https://api.test/";

/// Drives the app the way a shell would, holding on to every effect that
/// has not been answered yet.
pub struct Shell {
    app: AppTester<App, Effect>,
    pub model: Model,
    http: Vec<Request<HttpRequest>>,
    kv: Vec<Request<KeyValueOperation>>,
    pub renders: usize,
}

impl Shell {
    pub fn new() -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
            http: Vec::new(),
            kv: Vec::new(),
            renders: 0,
        }
    }

    /// A shell whose stored token has already been read.
    pub fn signed_in() -> Self {
        let mut shell = Self::new();
        shell.send(Event::AppStarted {
            api_base_url: Some(API.to_string()),
        });
        shell.resolve_kv_get("requests", None);
        shell.resolve_kv_get("token", Some("tok-123"));
        shell
    }

    pub fn send(&mut self, event: Event) {
        let update = self.app.update(event, &mut self.model);
        self.absorb(update);
    }

    fn absorb(&mut self, update: Update<Effect, Event>) {
        for effect in update.effects {
            match effect {
                Effect::Http(request) => self.http.push(request),
                Effect::KeyValue(request) => self.kv.push(request),
                Effect::Render(_) => self.renders += 1,
            }
        }
        for event in update.events {
            self.send(event);
        }
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    pub fn screen(&self) -> ScreenView {
        self.view().screen
    }

    /// Paths of the requests still waiting for a response, oldest first.
    pub fn pending_paths(&self) -> Vec<String> {
        self.http
            .iter()
            .map(|r| path_of(&r.operation))
            .collect()
    }

    pub fn has_request(&self, path: &str) -> bool {
        self.pending_paths().iter().any(|p| p == path)
    }

    /// Removes and returns the oldest pending request for `path`.
    pub fn take_http(&mut self, path: &str) -> Request<HttpRequest> {
        let index = self
            .http
            .iter()
            .position(|r| path_of(&r.operation) == path)
            .unwrap_or_else(|| panic!("no request for {path}, pending: {:?}", self.pending_paths()));
        self.http.remove(index)
    }

    pub fn resolve_http(&mut self, mut request: Request<HttpRequest>, result: HttpResult) {
        let update = self
            .app
            .resolve(&mut request, result)
            .expect("http request should resolve");
        self.absorb(update);
    }

    pub fn respond_json<T: Serialize>(&mut self, path: &str, status: u16, body: &T) {
        let request = self.take_http(path);
        let response = HttpResponse::status(status).json(body).build();
        self.resolve_http(request, HttpResult::Ok(response));
    }

    pub fn respond_error(&mut self, path: &str, status: u16) {
        self.respond_json(path, status, &json!({ "message": "failed" }));
    }

    pub fn take_kv(
        &mut self,
        matches: impl Fn(&KeyValueOperation) -> bool,
    ) -> Request<KeyValueOperation> {
        let index = self
            .kv
            .iter()
            .position(|r| matches(&r.operation))
            .expect("no matching kv request");
        self.kv.remove(index)
    }

    pub fn resolve_kv(&mut self, mut request: Request<KeyValueOperation>, result: KeyValueResult) {
        let update = self
            .app
            .resolve(&mut request, result)
            .expect("kv request should resolve");
        self.absorb(update);
    }

    pub fn resolve_kv_get(&mut self, key: &str, value: Option<&str>) {
        let request = self.take_kv(|op| matches!(op, KeyValueOperation::Get { key: k } if k == key));
        let value = value.map_or(Value::None, |v| Value::Bytes(v.as_bytes().to_vec()));
        self.resolve_kv(
            request,
            KeyValueResult::Ok {
                response: KeyValueResponse::Get { value },
            },
        );
    }

    /// Answers the pending delete of `key`, reporting that a value existed.
    pub fn resolve_kv_delete(&mut self, key: &str) {
        let request = self.take_kv(|op| matches!(op, KeyValueOperation::Delete { key: k } if k == key));
        self.resolve_kv(
            request,
            KeyValueResult::Ok {
                response: KeyValueResponse::Delete {
                    previous: Value::Bytes(b"old".to_vec()),
                },
            },
        );
    }

    pub fn kv_pending(&self) -> Vec<&KeyValueOperation> {
        self.kv.iter().map(|r| &r.operation).collect()
    }
}

/// Request path relative to the API root.
pub fn path_of(request: &HttpRequest) -> String {
    request
        .url
        .strip_prefix(API)
        .unwrap_or(&request.url)
        .to_string()
}

/// Header value by case-insensitive name.
pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn client(id: &str, first: &str, email: &str) -> serde_json::Value {
    json!({ "_id": id, "firstName": first, "lastName": "Doe", "email": email })
}

pub fn order(id: &str, status: &str, client: serde_json::Value) -> serde_json::Value {
    json!({
        "_id": id,
        "status": status,
        "client": client,
        "apartment": { "_id": "apt1", "name": "Maple Court" },
        "unitId": "u1",
        "unit": "101",
        "building": "b1",
        "bagQuantity": 2,
        "cleaner": { "_id": "cl1", "name": "Fresh Press" },
        "created": 0
    })
}

pub fn driver() -> serde_json::Value {
    json!({ "_id": "d1", "user": { "firstName": "Dee" }, "activeOrders": [] })
}

pub fn apartment() -> serde_json::Value {
    json!({
        "_id": "apt1",
        "name": "Maple Court",
        "address": { "formatted": "1 Maple St" },
        "buildings": { "b1": { "name": "North" } }
    })
}
