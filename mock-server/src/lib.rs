use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const STAFF_TOKEN: &str = "staff-token";
pub const ADMIN_TOKEN: &str = "admin-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub location: String,
    pub contact: String,
}

#[derive(Deserialize)]
pub struct BranchInput {
    pub location: String,
    pub contact: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub contact: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParcelInput {
    pub sender_info: Contact,
    pub receiver_info: Contact,
    pub item_size: String,
    pub origin_branch_id: String,
    pub destination_branch_id: String,
    pub shipping_method: String,
    pub quoted_amount: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub tracking_no: String,
    pub status: String,
    #[serde(flatten)]
    pub input: ParcelInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub item_size: Option<String>,
    pub shipping_method: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub branches: Vec<Branch>,
    pub parcels: Vec<Parcel>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Staff,
    Admin,
}

pub fn seed_branches() -> Vec<Branch> {
    [
        ("B1", "Colombo Central", "0112345678"),
        ("B2", "Kandy", "0812234567"),
        ("B3", "Galle", "0912234567"),
    ]
    .into_iter()
    .map(|(id, location, contact)| Branch {
        id: id.to_string(),
        location: location.to_string(),
        contact: contact.to_string(),
    })
    .collect()
}

/// Tariff used by `/api/payment/get-price`. `None` for unknown sizes or
/// methods.
pub fn price_for(item_size: &str, shipping_method: &str, from: &str, to: &str) -> Option<f64> {
    let base = match item_size {
        "small" => 350.0,
        "medium" => 600.0,
        "large" => 950.0,
        _ => return None,
    };
    let factor = match shipping_method {
        "standard" => 1.0,
        "express" => 1.5,
        _ => return None,
    };
    let transfer = if from == to { 0.0 } else { 100.0 };
    Some((base + transfer) * factor)
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        branches: seed_branches(),
        parcels: Vec::new(),
    }));
    Router::new()
        .route("/api/branches", get(list_branches).post(create_branch))
        .route("/api/branches/{id}", put(update_branch).delete(delete_branch))
        .route("/api/payment/get-price", get(get_price))
        .route("/api/parcels", get(list_parcels))
        .route("/api/parcels/addparcel", post(add_parcel))
        .route("/api/staff/verify", get(verify_staff))
        .route("/api/admin/verify", get(verify_admin))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn session_role(headers: &HeaderMap) -> Option<Role> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let token = cookies
        .split(';')
        .filter_map(|pair| pair.trim().strip_prefix("token="))
        .next()?;
    match token {
        STAFF_TOKEN => Some(Role::Staff),
        ADMIN_TOKEN => Some(Role::Admin),
        _ => None,
    }
}

fn require_session(headers: &HeaderMap) -> Result<Role, Response> {
    session_role(headers).ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn list_branches(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({ "data": { "branches": store.branches } }))
}

async fn create_branch(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<BranchInput>,
) -> Result<(StatusCode, Json<Value>), Response> {
    require_session(&headers)?;
    let mut store = db.write().await;
    if store.branches.iter().any(|b| b.location == input.location) {
        return Err(error(StatusCode::BAD_REQUEST, "location already exists"));
    }
    let branch = Branch {
        id: Uuid::new_v4().to_string(),
        location: input.location,
        contact: input.contact,
    };
    store.branches.push(branch.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": { "branch": branch } }))))
}

async fn update_branch(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<BranchInput>,
) -> Result<Json<Value>, Response> {
    require_session(&headers)?;
    let mut store = db.write().await;
    let branch = store
        .branches
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Branch not found"))?;
    branch.location = input.location;
    branch.contact = input.contact;
    Ok(Json(json!({ "data": { "branch": branch.clone() } })))
}

async fn delete_branch(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, Response> {
    require_session(&headers)?;
    let mut store = db.write().await;
    let before = store.branches.len();
    store.branches.retain(|b| b.id != id);
    if store.branches.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "Branch not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_price(State(db): State<Db>, Query(query): Query<PriceQuery>) -> Response {
    let (Some(from), Some(to)) = (query.from.as_deref(), query.to.as_deref()) else {
        return error(StatusCode::BAD_REQUEST, "from and to are required");
    };
    let store = db.read().await;
    let known = |id: &str| store.branches.iter().any(|b| b.id == id);
    if !known(from) || !known(to) {
        return error(StatusCode::NOT_FOUND, "Branch not found");
    }
    let size = query.item_size.as_deref().unwrap_or_default();
    let method = query.shipping_method.as_deref().unwrap_or_default();
    match price_for(size, method, from, to) {
        Some(price) => Json(json!({ "data": { "price": price, "currency": "LKR" } })).into_response(),
        None => error(StatusCode::BAD_REQUEST, "unknown itemSize or shippingMethod"),
    }
}

async fn add_parcel(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ParcelInput>,
) -> Result<(StatusCode, Json<Value>), Response> {
    require_session(&headers)?;
    let mut store = db.write().await;
    let known = |id: &str| store.branches.iter().any(|b| b.id == id);
    if !known(&input.origin_branch_id) || !known(&input.destination_branch_id) {
        return Err(error(StatusCode::BAD_REQUEST, "Branch not found"));
    }
    let price = price_for(
        &input.item_size,
        &input.shipping_method,
        &input.origin_branch_id,
        &input.destination_branch_id,
    );
    if price != Some(input.quoted_amount) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "quoted amount does not match current price",
        ));
    }
    let parcel = Parcel {
        id: Uuid::new_v4(),
        tracking_no: format!("CX-{:04}", store.parcels.len() + 1),
        status: "lodged".to_string(),
        input,
    };
    store.parcels.push(parcel.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Parcel added", "data": { "parcel": parcel } })),
    ))
}

async fn list_parcels(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Response> {
    require_session(&headers)?;
    let store = db.read().await;
    Ok(Json(json!({ "data": { "parcels": store.parcels } })))
}

async fn verify_staff(headers: HeaderMap) -> Response {
    match session_role(&headers) {
        Some(role) => verified(role),
        None => error(StatusCode::UNAUTHORIZED, "Unauthorized"),
    }
}

async fn verify_admin(headers: HeaderMap) -> Response {
    match session_role(&headers) {
        Some(Role::Admin) => verified(Role::Admin),
        Some(Role::Staff) => error(StatusCode::FORBIDDEN, "Admin access required"),
        None => error(StatusCode::UNAUTHORIZED, "Unauthorized"),
    }
}

fn verified(role: Role) -> Response {
    let username = match role {
        Role::Staff => "staff",
        Role::Admin => "admin",
    };
    Json(json!({ "data": { "username": username } })).into_response()
}
