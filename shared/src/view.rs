//! What the shell renders. Every field is derived from the model on demand.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorSeverity};
use crate::model::{Apartment, Cleaner, Loadable, Model, Order, Service, UnixTimeMs};
use crate::mutation::MutationKind;
use crate::navigation::{Route, Tab};
use crate::reconcile::{ClientRow, UnitReconciliation};
use crate::{LOCATION_REQUIRED_MESSAGE, NO_ORDERS_MESSAGE};

pub const UNIT_FAILED_MESSAGE: &str = "Could not get unit";
pub const UNITS_FAILED_MESSAGE: &str = "Could not get units";
pub const CLEANER_FAILED_MESSAGE: &str = "Could not get cleaner";
pub const ORDERS_FAILED_MESSAGE: &str = "Could not get orders";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderCard {
    pub id: String,
    pub client_name: String,
    pub client_email: String,
    pub apartment_name: String,
    pub building: String,
    pub unit: String,
    pub status: String,
    pub bag_quantity: u32,
    pub created_ago: String,
}

impl OrderCard {
    fn new(order: &Order, now: UnixTimeMs) -> Self {
        Self {
            id: order.id.to_string(),
            client_name: order.client.full_name(),
            client_email: order.client.email.clone(),
            apartment_name: order.apartment.name.clone(),
            building: order.building.clone(),
            unit: order.unit.clone(),
            status: order.status.to_string(),
            bag_quantity: order.bag_quantity,
            created_ago: format_time_ago(order.created.0, now.0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ActiveOrdersView {
    Loading,
    Error,
    Empty { message: String },
    Orders { orders: Vec<OrderCard> },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderDetailView {
    pub loading: bool,
    pub order: OrderCard,
    pub unit_id: String,
    pub cleaner_name: Option<String>,
    pub held_by_driver: bool,
    pub can_go_to_cleaner: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum UnitView {
    Loading,
    Failed {
        message: String,
    },
    Ready {
        unit_num: String,
        unit_id: String,
        building: String,
        apartment_name: String,
        rows: Vec<ClientRow>,
        selected_client: Option<String>,
        busy: bool,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EditBagQuantityView {
    pub order_id: String,
    pub current: u32,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApartmentItem {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub buildings: Vec<String>,
}

impl From<&Apartment> for ApartmentItem {
    fn from(apartment: &Apartment) -> Self {
        Self {
            id: apartment.id.to_string(),
            name: apartment.name.clone(),
            address: apartment.address.as_ref().map(|a| a.formatted.clone()),
            buildings: apartment.buildings.keys().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApartmentsView {
    pub loading: bool,
    pub apartments: Vec<ApartmentItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnitItem {
    pub unit_num: String,
    pub client_count: usize,
    pub active_order_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BuildingView {
    pub apartment_name: String,
    pub building: String,
    pub address: Option<String>,
    pub loading: bool,
    pub units: Vec<UnitItem>,
    /// Set when the unit list could not be fetched, as opposed to the
    /// building having no active units.
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceView {
    pub id: String,
    pub title: String,
    pub price: Option<f64>,
    pub requested: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CleanerItem {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub services: Vec<ServiceView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CleanersView {
    pub loading: bool,
    /// Shown instead of the list when there is no location.
    pub message: Option<String>,
    pub cleaners: Vec<CleanerItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CleanerView {
    pub loading: bool,
    pub cleaner: Option<CleanerItem>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub orders: Vec<OrderCard>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PickableOrder {
    pub order: OrderCard,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderPickerView {
    pub cleaner_name: String,
    pub loading: bool,
    pub orders: Vec<PickableOrder>,
    pub submitting: bool,
    pub can_submit: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ScreenView {
    Loading,
    Login,
    ActiveOrders(ActiveOrdersView),
    OrderDetail(OrderDetailView),
    Unit(UnitView),
    EditBagQuantity(EditBagQuantityView),
    Apartments(ApartmentsView),
    Building(BuildingView),
    Cleaners(CleanersView),
    Cleaner(CleanerView),
    CleanerDropOff(OrderPickerView),
    CleanerPickups(OrderPickerView),
    Account,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub screen: ScreenView,
    pub tab: Tab,
    pub can_go_back: bool,
    pub error: Option<UserFacingError>,
    pub location_message: Option<String>,
    pub is_authenticated: bool,
}

#[must_use]
pub fn format_time_ago(timestamp_ms: u64, now_ms: u64) -> String {
    if timestamp_ms > now_ms {
        return "Just now".into();
    }

    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;
    if diff_secs < 60 {
        return "Just now".into();
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }
    if diff_days < 30 {
        return format!("{}w ago", diff_days / 7);
    }
    if diff_days < 365 {
        return format!("{}mo ago", diff_days / 30);
    }

    format!("{}y ago", diff_days / 365)
}

fn service_view(service: &Service, model: &Model) -> ServiceView {
    ServiceView {
        id: service.id.to_string(),
        title: service.title.clone(),
        price: service.price,
        requested: model.requested_services.contains(&service.id),
    }
}

fn cleaner_item(cleaner: &Cleaner, model: &Model) -> CleanerItem {
    CleanerItem {
        id: cleaner.id.to_string(),
        name: cleaner.name.clone(),
        address: cleaner.address.as_ref().map(|a| a.formatted.clone()),
        services: cleaner.services.iter().map(|s| service_view(s, model)).collect(),
    }
}

fn active_orders_view(model: &Model) -> ActiveOrdersView {
    match &model.orders.active_orders {
        Loadable::Idle | Loadable::Loading => ActiveOrdersView::Loading,
        Loadable::Failed(_) => ActiveOrdersView::Error,
        Loadable::Ready(orders) if orders.is_empty() => ActiveOrdersView::Empty {
            message: NO_ORDERS_MESSAGE.to_string(),
        },
        Loadable::Ready(orders) => ActiveOrdersView::Orders {
            orders: orders.iter().map(|o| OrderCard::new(o, model.now)).collect(),
        },
    }
}

fn order_detail_view(order: &Order, model: &Model) -> OrderDetailView {
    OrderDetailView {
        loading: !matches!(
            model.orders.held_orders,
            Loadable::Ready(_) | Loadable::Failed(_)
        ),
        order: OrderCard::new(order, model.now),
        unit_id: order.unit_id.to_string(),
        cleaner_name: order.cleaner.as_ref().map(|c| c.name.clone()),
        held_by_driver: model.held_order_ids().contains(&order.id),
        can_go_to_cleaner: order.cleaner.is_some(),
    }
}

fn unit_view(unit_num: &str, apartment: &Apartment, bld: &str, model: &Model) -> UnitView {
    match &model.orders.unit {
        Loadable::Idle | Loadable::Loading => UnitView::Loading,
        Loadable::Failed(_) => UnitView::Failed {
            message: UNIT_FAILED_MESSAGE.into(),
        },
        Loadable::Ready(unit) => {
            let held = model.orders.held_orders.ready().map(Vec::as_slice).unwrap_or_default();
            let reconciliation = UnitReconciliation::new(unit, held);
            let rows = reconciliation.rows();
            let busy = model.orders.held_orders.is_loading()
                || rows.iter().any(|row| {
                    model.pending.is_targeting(row.client_id.as_str())
                        || row
                            .order_id
                            .as_ref()
                            .is_some_and(|id| model.pending.is_targeting(id.as_str()))
                });
            UnitView::Ready {
                unit_num: unit_num.to_string(),
                unit_id: unit.unit_id.to_string(),
                building: bld.to_string(),
                apartment_name: apartment.name.clone(),
                rows,
                selected_client: model.orders.selected_client.as_ref().map(ToString::to_string),
                busy,
            }
        }
    }
}

fn picker_view(
    cleaner_name: &str,
    source: &Loadable<Vec<Order>>,
    kind: MutationKind,
    cleaner_id: &str,
    model: &Model,
) -> OrderPickerView {
    let selected = &model.cleaners.selected_orders;
    let orders: Vec<PickableOrder> = source
        .ready()
        .map(|orders| {
            orders
                .iter()
                .map(|o| PickableOrder {
                    order: OrderCard::new(o, model.now),
                    selected: selected.contains(&o.id),
                })
                .collect()
        })
        .unwrap_or_default();
    let submitting = model.pending.is_pending(kind, cleaner_id);
    OrderPickerView {
        cleaner_name: cleaner_name.to_string(),
        loading: matches!(source, Loadable::Idle | Loadable::Loading),
        can_submit: !submitting && orders.iter().any(|o| o.selected),
        orders,
        submitting,
        error: source.is_failed().then(|| ORDERS_FAILED_MESSAGE.to_string()),
    }
}

fn screen_view(model: &Model) -> ScreenView {
    if model.session.is_loading() {
        return ScreenView::Loading;
    }
    if model.session.phase().needs_login() {
        return ScreenView::Login;
    }

    match model.nav.current() {
        Route::ActiveOrders => ScreenView::ActiveOrders(active_orders_view(model)),
        Route::OrderDetail { order } => ScreenView::OrderDetail(order_detail_view(order, model)),
        Route::Unit {
            unit_num,
            bld_id,
            apartment,
            ..
        } => ScreenView::Unit(unit_view(unit_num, apartment, bld_id.as_str(), model)),
        Route::EditBagQuantity { order } => ScreenView::EditBagQuantity(EditBagQuantityView {
            order_id: order.id.to_string(),
            current: order.bag_quantity,
            error: model.orders.bag_quantity_error.clone(),
            submitting: model
                .pending
                .is_pending(MutationKind::UpdateBagQuantity, order.id.as_str()),
        }),
        Route::Apartments => ScreenView::Apartments(ApartmentsView {
            loading: model.apartments.apartments.is_loading(),
            apartments: model
                .apartments
                .apartments
                .ready()
                .map(|list| list.iter().map(ApartmentItem::from).collect())
                .unwrap_or_default(),
        }),
        Route::Building {
            bld_id, apartment, ..
        } => {
            let building = apartment.buildings.get(bld_id.as_str());
            ScreenView::Building(BuildingView {
                apartment_name: apartment.name.clone(),
                building: building
                    .and_then(|b| b.name.clone())
                    .unwrap_or_else(|| bld_id.to_string()),
                address: building
                    .and_then(|b| b.address.as_ref())
                    .map(|a| a.formatted.clone()),
                loading: model.apartments.active_units.is_loading(),
                units: model
                    .apartments
                    .active_units
                    .ready()
                    .map(|units| {
                        units
                            .iter()
                            .map(|(num, unit)| UnitItem {
                                unit_num: num.clone(),
                                client_count: unit.clients.len(),
                                active_order_count: unit.active_orders.len(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                error: model
                    .apartments
                    .active_units
                    .is_failed()
                    .then(|| UNITS_FAILED_MESSAGE.to_string()),
            })
        }
        Route::Cleaners => ScreenView::Cleaners(CleanersView {
            loading: model.cleaners.nearby.is_loading(),
            message: model
                .session
                .location()
                .is_none()
                .then(|| LOCATION_REQUIRED_MESSAGE.to_string()),
            cleaners: model
                .cleaners
                .nearby
                .ready()
                .map(|list| list.iter().map(|c| cleaner_item(c, model)).collect())
                .unwrap_or_default(),
        }),
        Route::Cleaner { .. } => {
            let cleaner = model.cleaners.cleaner.ready();
            ScreenView::Cleaner(CleanerView {
                loading: model.cleaners.cleaner.is_loading()
                    || model.cleaners.cleaner_orders.is_loading(),
                cleaner: cleaner.map(|c| cleaner_item(c, model)),
                email: cleaner.and_then(|c| c.email.clone()),
                phone_number: cleaner.and_then(|c| c.phone_number.clone()),
                orders: model
                    .cleaners
                    .cleaner_orders
                    .ready()
                    .map(|orders| orders.iter().map(|o| OrderCard::new(o, model.now)).collect())
                    .unwrap_or_default(),
                error: if model.cleaners.cleaner.is_failed() {
                    Some(CLEANER_FAILED_MESSAGE.to_string())
                } else {
                    model
                        .cleaners
                        .cleaner_orders
                        .is_failed()
                        .then(|| ORDERS_FAILED_MESSAGE.to_string())
                },
            })
        }
        Route::CleanerDropOff {
            cleaner_id,
            cleaner_name,
        } => ScreenView::CleanerDropOff(picker_view(
            cleaner_name,
            &model.orders.held_orders,
            MutationKind::CleanerDropOff,
            cleaner_id.as_str(),
            model,
        )),
        Route::CleanerPickups {
            cleaner_id,
            cleaner_name,
        } => ScreenView::CleanerPickups(picker_view(
            cleaner_name,
            &model.cleaners.pickups,
            MutationKind::PickUpOrders,
            cleaner_id.as_str(),
            model,
        )),
        Route::Account => ScreenView::Account,
    }
}

#[must_use]
pub fn view(model: &Model) -> ViewModel {
    ViewModel {
        screen: screen_view(model),
        tab: model.nav.tab(),
        can_go_back: model.nav.depth() > 1,
        error: model.active_error.as_ref().map(UserFacingError::from),
        location_message: model
            .location_denied
            .then(|| LOCATION_REQUIRED_MESSAGE.to_string()),
        is_authenticated: model.session.phase().is_authenticated(),
    }
}
