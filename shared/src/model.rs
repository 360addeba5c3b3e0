use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::api::ApiError;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::fetch::FetchTracker;
use crate::mutation::PendingMutations;
use crate::navigation::Navigation;
use crate::services::RequestedServices;
use crate::session::Session;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(OrderId);
typed_id!(ClientId);
typed_id!(UnitId);
typed_id!(ApartmentId);
typed_id!(BuildingId);
typed_id!(CleanerId);
typed_id!(DriverId);
typed_id!(ServiceId);

/// Validated lat/lon
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        if !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self { lat, lon })
    }
}

/// Explicit timestamp unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    pub fn now() -> Self {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(ms)
    }
}

// --- Order status ---

/// Lifecycle stage reported by the backend. Only the stages that gate driver
/// actions get their own variant; everything else is kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    ClothesToCleaner,
    PickedUpFromCleaner,
    Other(String),
}

impl OrderStatus {
    pub const CLOTHES_TO_CLEANER: &'static str = "Clothes To Cleaner";
    pub const PICKED_UP_FROM_CLEANER: &'static str = "Picked Up From Cleaner";

    pub fn as_str(&self) -> &str {
        match self {
            Self::ClothesToCleaner => Self::CLOTHES_TO_CLEANER,
            Self::PickedUpFromCleaner => Self::PICKED_UP_FROM_CLEANER,
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            Self::CLOTHES_TO_CLEANER => Self::ClothesToCleaner,
            Self::PICKED_UP_FROM_CLEANER => Self::PickedUpFromCleaner,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Backend entities ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: ClientId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Address {
    #[serde(default)]
    pub formatted: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApartmentRef {
    #[serde(rename = "_id")]
    pub id: ApartmentId,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CleanerRef {
    #[serde(rename = "_id")]
    pub id: CleanerId,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub status: OrderStatus,
    pub client: Client,
    pub apartment: ApartmentRef,
    pub unit_id: UnitId,
    /// Unit number as displayed to the driver.
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub bag_quantity: u32,
    #[serde(default)]
    pub cleaner: Option<CleanerRef>,
    #[serde(default)]
    pub drop_off_address: Option<Address>,
    #[serde(default)]
    pub created: UnixTimeMs,
}

/// Order reference as held by a driver: either a bare id or an embedded
/// order document, depending on how the backend populated it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OrderRefRepr", into = "String")]
pub struct OrderRef(pub OrderId);

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderRefRepr {
    Id(String),
    Document {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl From<OrderRefRepr> for OrderRef {
    fn from(repr: OrderRefRepr) -> Self {
        match repr {
            OrderRefRepr::Id(id) | OrderRefRepr::Document { id } => Self(OrderId(id)),
        }
    }
}

impl From<OrderRef> for String {
    fn from(reference: OrderRef) -> Self {
        reference.0 .0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(rename = "_id")]
    pub id: DriverId,
    #[serde(default)]
    pub user: Option<PersonName>,
    #[serde(default)]
    pub active_orders: Vec<OrderRef>,
}

/// A unit as returned by the active-units listing of a building.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(default)]
    pub unit_id: Option<UnitId>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub active_orders: Vec<Order>,
}

/// A single unit fetched by id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitResponse {
    pub unit_id: UnitId,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub active_orders: Vec<Order>,
}

impl UnitResponse {
    pub fn client(&self, client_id: &ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| &c.id == client_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Building {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Apartment {
    #[serde(rename = "_id")]
    pub id: ApartmentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub buildings: BTreeMap<String, Building>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: ServiceId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cleaner {
    #[serde(rename = "_id")]
    pub id: CleanerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub services: Vec<Service>,
}

// --- App model ---

/// State of one remote value owned by a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Everything the active-orders, order-detail and unit screens load.
#[derive(Debug, Default)]
pub struct OrdersState {
    /// Driver's own list; a failed driver fetch is `Failed`, a failed list
    /// fetch is an empty list.
    pub active_orders: Loadable<Vec<Order>>,
    /// Orders the driver currently holds, used to mark "held" on detail,
    /// unit and drop-off screens.
    pub held_orders: Loadable<Vec<Order>>,
    pub unit: Loadable<UnitResponse>,
    pub selected_client: Option<ClientId>,
    /// Inline banner on the bag-quantity screen.
    pub bag_quantity_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ApartmentsState {
    pub apartments: Loadable<Vec<Apartment>>,
    pub active_units: Loadable<BTreeMap<String, Unit>>,
}

#[derive(Debug, Default)]
pub struct CleanersState {
    pub nearby: Loadable<Vec<Cleaner>>,
    pub cleaner: Loadable<Cleaner>,
    pub cleaner_orders: Loadable<Vec<Order>>,
    pub pickups: Loadable<Vec<Order>>,
    /// Multi-select on the drop-off and pickups screens.
    pub selected_orders: BTreeSet<OrderId>,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub session: Session,
    pub nav: Navigation,
    pub fetches: FetchTracker,
    pub pending: PendingMutations,
    pub requested_services: RequestedServices,
    pub location_denied: bool,
    pub orders: OrdersState,
    pub apartments: ApartmentsState,
    pub cleaners: CleanersState,
    pub active_error: Option<AppError>,
    pub now: UnixTimeMs,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    /// Ids of the orders the driver holds, empty until they have loaded.
    pub fn held_order_ids(&self) -> BTreeSet<&OrderId> {
        self.orders
            .held_orders
            .ready()
            .map(|orders| orders.iter().map(|o| &o.id).collect())
            .unwrap_or_default()
    }
}
