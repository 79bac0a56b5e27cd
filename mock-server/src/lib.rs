//! In-memory stand-in for the remote payment API.
//!
//! Speaks the same wire shape as the real service: basic-auth API key, form
//! bodies and query strings with `parent[child]` keys, JSON responses and
//! `{"error": {...}}` envelopes on failure. Objects live in a per-collection
//! list keyed by the URL segment (`plans`, `customers`, ...).

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

/// Key accepted by `app()`.
pub const TEST_API_KEY: &str = "sk_test_mock";

pub struct MockState {
    api_key: String,
    db: RwLock<HashMap<String, Vec<Value>>>,
}

pub type Db = Arc<MockState>;

type Pairs = Vec<(String, String)>;

/// Error response in the remote API's envelope.
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn not_found(collection: &str, id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "invalid_request_error",
            message: format!("No such {}: {id}", object_name(collection)),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request_error",
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "invalid_request_error",
            message: "Invalid API Key provided".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({"error": {"type": self.kind, "message": self.message}});
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with_key(TEST_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state: Db = Arc::new(MockState {
        api_key: api_key.to_string(),
        db: RwLock::new(HashMap::new()),
    });
    Router::new()
        .route("/v1/{collection}", get(list_objects).post(create_object))
        .route(
            "/v1/{collection}/{id}",
            get(get_object)
                .post(update_object)
                .put(update_object)
                .delete(delete_object),
        )
        .route(
            "/v1/{collection}/{id}/{sub}",
            get(get_nested).post(create_nested).delete(delete_nested),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_api_key(State(db): State<Db>, request: Request, next: Next) -> Response {
    let expected = format!("Basic {}", STANDARD.encode(format!("{}:", db.api_key)));
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        debug!(uri = %request.uri(), "rejecting request without a valid API key");
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}

/// `customers` -> `customer`, `application_fees` -> `application_fee`.
fn object_name(collection: &str) -> &str {
    collection.strip_suffix('s').unwrap_or(collection)
}

fn id_prefix(collection: &str) -> &str {
    match collection {
        "charges" => "ch",
        "customers" => "cus",
        "cards" => "card",
        "invoices" => "in",
        "invoiceitems" => "ii",
        "transfers" => "tr",
        "recipients" => "rp",
        "application_fees" => "fee",
        "events" => "evt",
        "tokens" => "tok",
        "coupons" => "co",
        "plans" => "plan",
        "subscription" => "sub",
        other => object_name(other),
    }
}

fn new_id(collection: &str) -> String {
    format!("{}_{}", id_prefix(collection), Uuid::new_v4().simple())
}

/// Parse a form body; an empty body is an empty form regardless of headers.
fn parse_form(body: &Bytes) -> Result<Pairs, ApiError> {
    serde_urlencoded::from_bytes(body).map_err(|e| ApiError::bad_request(format!("malformed form body: {e}")))
}

/// Split `card[metadata][tier]` into `["card", "metadata", "tier"]`.
fn key_path(key: &str) -> Vec<&str> {
    match key.find('[') {
        Some(open) if key.ends_with(']') => {
            let mut parts = vec![&key[..open]];
            parts.extend(key[open + 1..key.len() - 1].split("]["));
            parts
        }
        _ => vec![key],
    }
}

/// Integers and booleans come back typed, like the real API returns them.
fn scalar(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return Value::from(n);
    }
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}

/// Rebuild nested objects from flattened `parent[child]` pairs.
pub fn unflatten(pairs: &[(String, String)]) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in pairs {
        let parts = key_path(key);
        let (last, parents) = match parts.split_last() {
            Some(split) => split,
            None => continue,
        };
        let mut node = &mut root;
        for part in parents {
            let entry = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }
        node.insert(last.to_string(), scalar(value));
    }
    root
}

fn merge(target: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (k, v) in fields {
        match v {
            Value::Object(incoming) if target.get(&k).is_some_and(Value::is_object) => {
                if let Some(Value::Object(existing)) = target.get_mut(&k) {
                    merge(existing, incoming);
                }
            }
            v => {
                target.insert(k, v);
            }
        }
    }
}

fn list_envelope(collection: &str, data: Vec<Value>) -> Value {
    json!({"object": "list", "url": format!("/v1/{collection}"), "has_more": false, "data": data})
}

async fn list_objects(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(query): Query<Pairs>,
) -> Json<Value> {
    if collection == "account" {
        return Json(json!({"id": "acct_mock", "object": "account", "transfer_enabled": true}));
    }
    let limit = query
        .iter()
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(10);
    let objects = db.db.read().await;
    let data = objects
        .get(&collection)
        .map(|list| list.iter().take(limit).cloned().collect())
        .unwrap_or_default();
    Json(list_envelope(&collection, data))
}

async fn create_object(
    State(db): State<Db>,
    Path(collection): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let mut fields = unflatten(&parse_form(&body)?);
    let id = match fields.remove("id") {
        Some(Value::String(id)) => id,
        Some(other) => other.to_string(),
        None => new_id(&collection),
    };

    let mut objects = db.db.write().await;
    let list = objects.entry(collection.clone()).or_default();
    if list.iter().any(|o| o["id"] == id.as_str()) {
        return Err(ApiError::bad_request(format!("{} already exists: {id}", object_name(&collection))));
    }

    let mut object = Map::new();
    object.insert("id".to_string(), Value::String(id.clone()));
    object.insert("object".to_string(), Value::String(object_name(&collection).to_string()));
    object.insert("livemode".to_string(), Value::Bool(false));
    merge(&mut object, fields);
    let object = Value::Object(object);
    list.push(object.clone());
    info!(%collection, %id, "created object");
    Ok(Json(object))
}

async fn get_object(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, ApiError> {
    let objects = db.db.read().await;
    if collection == "invoices" && id == "upcoming" {
        return upcoming_invoice(&objects, &query).map(Json);
    }
    objects
        .get(&collection)
        .and_then(|list| list.iter().find(|o| o["id"] == id.as_str()))
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&collection, &id))
}

async fn update_object(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = unflatten(&parse_form(&body)?);
    let mut objects = db.db.write().await;
    let object = objects
        .get_mut(&collection)
        .and_then(|list| list.iter_mut().find(|o| o["id"] == id.as_str()))
        .ok_or_else(|| ApiError::not_found(&collection, &id))?;
    if let Value::Object(map) = object {
        merge(map, fields);
    }
    Ok(Json(object.clone()))
}

async fn delete_object(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let mut objects = db.db.write().await;
    let list = objects
        .get_mut(&collection)
        .ok_or_else(|| ApiError::not_found(&collection, &id))?;
    let before = list.len();
    list.retain(|o| o["id"] != id.as_str());
    if list.len() == before {
        return Err(ApiError::not_found(&collection, &id));
    }
    Ok(Json(json!({"id": id, "deleted": true})))
}

async fn get_nested(
    State(db): State<Db>,
    Path((collection, id, sub)): Path<(String, String, String)>,
    Query(query): Query<Pairs>,
) -> Result<Json<Value>, ApiError> {
    let objects = db.db.read().await;
    if collection == "invoices" && id == "upcoming" && sub == "lines" {
        let invoice = upcoming_invoice(&objects, &query)?;
        return Ok(Json(invoice["lines"].clone()));
    }
    let parent = find(&objects, &collection, &id)?;
    match parent.get(&sub) {
        Some(child) if !child.is_null() => Ok(Json(child.clone())),
        _ => Err(ApiError::not_found(&sub, &id)),
    }
}

/// Creates or replaces a singleton child such as `customers/{id}/subscription`.
async fn create_nested(
    State(db): State<Db>,
    Path((collection, id, sub)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = unflatten(&parse_form(&body)?);
    let mut objects = db.db.write().await;
    let parent = objects
        .get_mut(&collection)
        .and_then(|list| list.iter_mut().find(|o| o["id"] == id.as_str()))
        .ok_or_else(|| ApiError::not_found(&collection, &id))?;

    let mut child = Map::new();
    child.insert("id".to_string(), Value::String(new_id(&sub)));
    child.insert("object".to_string(), Value::String(object_name(&sub).to_string()));
    child.insert(object_name(&collection).to_string(), Value::String(id.clone()));
    merge(&mut child, fields);
    let child = Value::Object(child);
    parent[sub.as_str()] = child.clone();
    info!(%collection, %id, %sub, "attached nested object");
    Ok(Json(child))
}

async fn delete_nested(
    State(db): State<Db>,
    Path((collection, id, sub)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let mut objects = db.db.write().await;
    let parent = objects
        .get_mut(&collection)
        .and_then(|list| list.iter_mut().find(|o| o["id"] == id.as_str()))
        .ok_or_else(|| ApiError::not_found(&collection, &id))?;
    let mut child = parent
        .as_object_mut()
        .and_then(|map| map.remove(&sub))
        .filter(|child| !child.is_null())
        .ok_or_else(|| ApiError::not_found(&sub, &id))?;
    child["status"] = Value::String("canceled".to_string());
    Ok(Json(child))
}

fn find<'a>(
    objects: &'a HashMap<String, Vec<Value>>,
    collection: &str,
    id: &str,
) -> Result<&'a Value, ApiError> {
    objects
        .get(collection)
        .and_then(|list| list.iter().find(|o| o["id"] == id))
        .ok_or_else(|| ApiError::not_found(collection, id))
}

/// The next invoice for `?customer=...`, one line per active subscription.
fn upcoming_invoice(objects: &HashMap<String, Vec<Value>>, query: &Pairs) -> Result<Value, ApiError> {
    let customer_id = query
        .iter()
        .find(|(k, _)| k == "customer")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| ApiError::bad_request("Missing required param: customer."))?;
    let customer = find(objects, "customers", customer_id)?;
    let subscription = customer
        .get("subscription")
        .filter(|s| !s.is_null())
        .ok_or_else(|| ApiError::not_found("invoices", "upcoming"))?;

    let plan = match subscription.get("plan") {
        Some(Value::String(plan_id)) => find(objects, "plans", plan_id)
            .cloned()
            .unwrap_or_else(|_| json!({"id": plan_id})),
        Some(other) => other.clone(),
        None => Value::Null,
    };
    let amount = plan.get("amount").cloned().unwrap_or(Value::from(0));
    let line = json!({
        "id": subscription["id"],
        "object": "line_item",
        "type": "subscription",
        "amount": amount,
        "plan": plan,
    });
    Ok(json!({
        "object": "invoice",
        "customer": customer_id,
        "amount_due": amount,
        "lines": {
            "object": "list",
            "url": "/v1/invoices/upcoming/lines",
            "has_more": false,
            "data": [line],
        },
    }))
}
