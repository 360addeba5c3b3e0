use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::ApiResult;
use crate::capabilities::KvResult;
use crate::fetch::FetchTicket;
use crate::model::{
    Apartment, ApartmentId, BuildingId, Cleaner, CleanerId, ClientId, Driver, Order, OrderId,
    Service, Unit, UnitResponse,
};
use crate::mutation::PendingMutation;
use crate::navigation::Tab;
use crate::reconcile::UnitAction;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Lifecycle & session
    AppStarted {
        api_base_url: Option<String>,
    },
    LoginCompleted {
        token: String,
    },
    LogoutRequested,
    LocationPermissionResult {
        granted: bool,
    },
    LocationReceived {
        lat: f64,
        lon: f64,
    },
    DismissError,

    // Navigation
    NavigateBack,
    SwitchTab(Tab),
    /// Re-runs the current screen's fetches.
    Refresh,

    // Active orders & order detail
    OrderSelected {
        order_id: OrderId,
    },
    GoToUnitRequested,
    GoToCleanerRequested,
    EditBagQuantityRequested,
    BagQuantitySubmitted {
        input: String,
    },

    // Apartments & units
    BuildingSelected {
        apartment_id: ApartmentId,
        building_id: BuildingId,
    },
    UnitSelected {
        unit_num: String,
    },
    ClientSelected {
        client_id: ClientId,
    },
    UnitActionRequested {
        client_id: ClientId,
        action: UnitAction,
    },

    // Cleaners
    CleanerSelected {
        cleaner_id: CleanerId,
    },
    CleanerDropOffRequested,
    CleanerPickupsRequested,
    OrderToggled {
        order_id: OrderId,
    },
    SubmitSelectedOrders,
    ServiceToggled {
        service: Service,
    },

    // Capability responses (boxed to keep the enum small)
    TokenLoaded(Box<KvResult>),
    TokenPersisted(Box<KvResult>),
    RequestedServicesLoaded(Box<KvResult>),
    RequestedServicesPersisted(Box<KvResult>),

    DriverFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Driver>>,
    },
    /// The driver's active orders. Which screen consumes them follows from
    /// the ticket.
    DriverOrdersFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Vec<Order>>>,
    },
    UnitApartmentFetched {
        order: Box<Order>,
        result: Box<ApiResult<Apartment>>,
    },
    UnitFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<UnitResponse>>,
    },
    ApartmentsFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Vec<Apartment>>>,
    },
    ActiveUnitsFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<BTreeMap<String, Unit>>>,
    },
    NearbyCleanersFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Vec<Cleaner>>>,
    },
    CleanerFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Cleaner>>,
    },
    CleanerOrdersFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Vec<Order>>>,
    },
    PickupsFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Vec<Order>>>,
    },
    OrderMutated {
        mutation: PendingMutation,
        result: Box<ApiResult<Order>>,
    },
    OrdersMutated {
        mutation: PendingMutation,
        result: Box<ApiResult<Vec<Order>>>,
    },
}

impl Event {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::LoginCompleted { .. } => "login_completed",
            Self::LogoutRequested => "logout_requested",
            Self::LocationPermissionResult { .. } => "location_permission_result",
            Self::LocationReceived { .. } => "location_received",
            Self::DismissError => "dismiss_error",
            Self::NavigateBack => "navigate_back",
            Self::SwitchTab(_) => "switch_tab",
            Self::Refresh => "refresh",
            Self::OrderSelected { .. } => "order_selected",
            Self::GoToUnitRequested => "go_to_unit_requested",
            Self::GoToCleanerRequested => "go_to_cleaner_requested",
            Self::EditBagQuantityRequested => "edit_bag_quantity_requested",
            Self::BagQuantitySubmitted { .. } => "bag_quantity_submitted",
            Self::BuildingSelected { .. } => "building_selected",
            Self::UnitSelected { .. } => "unit_selected",
            Self::ClientSelected { .. } => "client_selected",
            Self::UnitActionRequested { .. } => "unit_action_requested",
            Self::CleanerSelected { .. } => "cleaner_selected",
            Self::CleanerDropOffRequested => "cleaner_drop_off_requested",
            Self::CleanerPickupsRequested => "cleaner_pickups_requested",
            Self::OrderToggled { .. } => "order_toggled",
            Self::SubmitSelectedOrders => "submit_selected_orders",
            Self::ServiceToggled { .. } => "service_toggled",
            Self::TokenLoaded(_) => "token_loaded",
            Self::TokenPersisted(_) => "token_persisted",
            Self::RequestedServicesLoaded(_) => "requested_services_loaded",
            Self::RequestedServicesPersisted(_) => "requested_services_persisted",
            Self::DriverFetched { .. } => "driver_fetched",
            Self::DriverOrdersFetched { .. } => "driver_orders_fetched",
            Self::UnitApartmentFetched { .. } => "unit_apartment_fetched",
            Self::UnitFetched { .. } => "unit_fetched",
            Self::ApartmentsFetched { .. } => "apartments_fetched",
            Self::ActiveUnitsFetched { .. } => "active_units_fetched",
            Self::NearbyCleanersFetched { .. } => "nearby_cleaners_fetched",
            Self::CleanerFetched { .. } => "cleaner_fetched",
            Self::CleanerOrdersFetched { .. } => "cleaner_orders_fetched",
            Self::PickupsFetched { .. } => "pickups_fetched",
            Self::OrderMutated { .. } => "order_mutated",
            Self::OrdersMutated { .. } => "orders_mutated",
        }
    }

    /// Events raised by the shell on behalf of the driver.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LoginCompleted { .. }
                | Self::LogoutRequested
                | Self::DismissError
                | Self::NavigateBack
                | Self::SwitchTab(_)
                | Self::Refresh
                | Self::OrderSelected { .. }
                | Self::GoToUnitRequested
                | Self::GoToCleanerRequested
                | Self::EditBagQuantityRequested
                | Self::BagQuantitySubmitted { .. }
                | Self::BuildingSelected { .. }
                | Self::UnitSelected { .. }
                | Self::ClientSelected { .. }
                | Self::UnitActionRequested { .. }
                | Self::CleanerSelected { .. }
                | Self::CleanerDropOffRequested
                | Self::CleanerPickupsRequested
                | Self::OrderToggled { .. }
                | Self::SubmitSelectedOrders
                | Self::ServiceToggled { .. }
        )
    }
}
