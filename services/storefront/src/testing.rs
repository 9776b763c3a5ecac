//! Scripted fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use storefront_core::domain::{Credentials, Role, User};
use storefront_core::ports::{ApiRequest, ApiResponse, HttpTransport, Method, PortError, PortResult};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::adapters::{MemoryTokenStore, RecordingNavigator};
use crate::api::StorefrontApi;
use crate::client::ApiClient;

enum Scripted {
    Respond(ApiResponse),
    Gated(Arc<Notify>, ApiResponse),
    Fail(String),
}

impl Scripted {
    fn duplicate(&self) -> Scripted {
        match self {
            Scripted::Respond(response) => Scripted::Respond(response.clone()),
            Scripted::Gated(gate, response) => Scripted::Gated(gate.clone(), response.clone()),
            Scripted::Fail(message) => Scripted::Fail(message.clone()),
        }
    }
}

struct Rule {
    method: Method,
    path: String,
    query: Option<(String, String)>,
    queue: VecDeque<Scripted>,
}

impl Rule {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && match &self.query {
                Some((key, value)) => request.query.iter().any(|(k, v)| k == key && v == value),
                None => true,
            }
    }
}

/// An `HttpTransport` that answers from per-route queues and records every
/// request. The last queued answer of a route repeats indefinitely.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, query: Option<(String, String)>, answer: Scripted) {
        let mut rules = self.rules.lock().unwrap();
        if let Some(rule) = rules
            .iter_mut()
            .find(|r| r.method == method && r.path == path && r.query == query)
        {
            rule.queue.push_back(answer);
            return;
        }
        rules.push(Rule {
            method,
            path: path.to_string(),
            query,
            queue: VecDeque::from([answer]),
        });
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        let response = ApiResponse::new(status, body.to_string());
        self.push(method, path, None, Scripted::Respond(response));
    }

    pub fn on_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        let response = ApiResponse::new(status, body.to_string());
        self.push(method, path, None, Scripted::Respond(response));
    }

    pub fn on_query(&self, method: Method, path: &str, key: &str, value: &str, status: u16, body: Value) {
        let response = ApiResponse::new(status, body.to_string());
        let query = Some((key.to_string(), value.to_string()));
        self.push(method, path, query, Scripted::Respond(response));
    }

    /// Like [`Self::on`], but the answer is held until the returned gate is notified.
    pub fn gated(&self, method: Method, path: &str, status: u16, body: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        let response = ApiResponse::new(status, body.to_string());
        self.push(method, path, None, Scripted::Gated(gate.clone(), response));
        gate
    }

    /// Like [`Self::on_query`], but the answer is held until the returned gate is notified.
    pub fn gated_query(&self, method: Method, path: &str, key: &str, value: &str, body: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        let response = ApiResponse::new(200, body.to_string());
        let query = Some((key.to_string(), value.to_string()));
        self.push(method, path, query, Scripted::Gated(gate.clone(), response));
        gate
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(method, path, None, Scripted::Fail(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn next_answer(&self, request: &ApiRequest) -> Option<Scripted> {
        let mut rules = self.rules.lock().unwrap();
        // Query-specific rules win over catch-all ones.
        let index = rules
            .iter()
            .position(|r| r.query.is_some() && r.matches(request))
            .or_else(|| rules.iter().position(|r| r.matches(request)))?;
        let queue = &mut rules[index].queue;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(Scripted::duplicate)
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> PortResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next_answer(&request) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            Some(Scripted::Fail(message)) => Err(PortError::Transport(message)),
            None => Ok(ApiResponse::new(404, "unscripted")),
        }
    }
}

/// A wired-up client stack over a scripted transport.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub api: Arc<StorefrontApi>,
}

impl Harness {
    pub fn new(credentials: Credentials) -> Self {
        let transport = ScriptedTransport::new();
        let tokens = Arc::new(MemoryTokenStore::new(credentials));
        let navigator = Arc::new(RecordingNavigator::new());
        let client = ApiClient::new(transport.clone(), tokens.clone(), navigator.clone());
        let api = Arc::new(StorefrontApi::new(Arc::new(client)));
        Self {
            transport,
            tokens,
            navigator,
            api,
        }
    }

    pub fn signed_in() -> Self {
        Self::new(Credentials {
            access: Some("access-0".into()),
            refresh: Some("refresh-0".into()),
            user: Some(user(Role::Client)),
        })
    }

    pub fn anonymous() -> Self {
        Self::new(Credentials::default())
    }
}

pub fn user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        username: format!("{}-user", role.as_str().to_lowercase()),
        email: "buyer@lab.example".into(),
        role,
        is_active: true,
        first_name: String::new(),
        last_name: String::new(),
    }
}

pub fn user_json(role: Role) -> Value {
    serde_json::to_value(user(role)).unwrap()
}

pub fn product_json(name: &str, price: &str, stock: i64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": format!("{} for laboratory use", name),
        "price": price,
        "promo_price": null,
        "stock": stock,
        "images": [],
        "main_image": null
    })
}

pub fn cart_item_json(id: i64, name: &str, quantity: u32, price: &str, stock: i64) -> Value {
    json!({
        "id": id,
        "product": product_json(name, price, stock),
        "quantity": quantity,
        "price_snapshot": price,
        "created_at": "2026-10-14T09:30:00Z"
    })
}

pub fn cart_json(items: Vec<Value>) -> Value {
    json!({ "id": Uuid::new_v4(), "user": Uuid::new_v4(), "items": items, "created_at": "2026-10-14T09:00:00Z" })
}

pub fn order_json(total: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user": Uuid::new_v4(),
        "status": "CREATED",
        "total": total,
        "items": [],
        "created_at": "2026-10-15T10:00:00Z"
    })
}
