use tracing::{debug, info, warn};

use super::App;
use crate::api::ApiResult;
use crate::capabilities::Capabilities;
use crate::error::AppError;
use crate::event::Event;
use crate::fetch::{FetchTicket, ScreenKey};
use crate::model::{Apartment, BuildingId, Driver, Loadable, Model, Order, OrderId};
use crate::mutation::{evaluate_bag_quantity, BagQuantityDecision, MutationKind, PendingMutation};
use crate::navigation::Route;

impl App {
    pub(super) fn focus_active_orders(ticket: FetchTicket, model: &mut Model, caps: &Capabilities) {
        model.orders.active_orders = Loadable::Loading;
        Self::api(model, caps).get_driver(move |result| Event::DriverFetched {
            ticket,
            result: Box::new(result),
        });
    }

    /// The driver list is only requested once the profile has loaded.
    pub(super) fn driver_fetched(
        ticket: FetchTicket,
        result: ApiResult<Driver>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if !model.fetches.accept(ticket, "driver") {
            return;
        }
        match result {
            Ok(driver) => {
                debug!(driver_id = %driver.id, held = driver.active_orders.len(), "driver loaded");
                Self::api(model, caps).get_driver_active_orders(move |result| {
                    Event::DriverOrdersFetched {
                        ticket,
                        result: Box::new(result),
                    }
                });
            }
            Err(e) => {
                Self::api_failed(&e, model, caps);
                model.orders.active_orders = Loadable::Failed(e);
            }
        }
    }

    pub(super) fn driver_orders_fetched(
        ticket: FetchTicket,
        result: ApiResult<Vec<Order>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if !model.fetches.accept(ticket, "driver_orders") {
            return;
        }
        match ticket.screen {
            ScreenKey::ActiveOrders => {
                Self::settle_or_empty(result, |m| &mut m.orders.active_orders, model, caps);
            }
            ScreenKey::OrderDetail | ScreenKey::Unit | ScreenKey::CleanerDropOff => {
                Self::settle_or_empty(result, |m| &mut m.orders.held_orders, model, caps);
            }
            screen => warn!(screen = ?screen, "driver orders delivered to a screen that never asks for them"),
        }
    }

    /// Finds `order_id` among the orders currently on screen.
    fn find_order(order_id: &OrderId, model: &Model) -> Option<Order> {
        let lists = [
            model.orders.active_orders.ready(),
            model.orders.held_orders.ready(),
            model.orders.unit.ready().map(|u| &u.active_orders),
            model.cleaners.cleaner_orders.ready(),
            model.cleaners.pickups.ready(),
        ];
        lists
            .into_iter()
            .flatten()
            .flat_map(|orders| orders.iter())
            .find(|o| &o.id == order_id)
            .cloned()
    }

    pub(super) fn select_order(order_id: &OrderId, model: &mut Model, caps: &Capabilities) {
        match Self::find_order(order_id, model) {
            Some(order) => Self::navigate(
                Route::OrderDetail {
                    order: Box::new(order),
                },
                model,
                caps,
            ),
            None => warn!(order_id = %order_id, "selected order is not on screen"),
        }
    }

    fn detail_order(model: &Model) -> Option<Order> {
        match model.nav.current() {
            Route::OrderDetail { order } => Some((**order).clone()),
            _ => None,
        }
    }

    pub(super) fn go_to_unit(model: &mut Model, caps: &Capabilities) {
        let Some(order) = Self::detail_order(model) else {
            warn!("go to unit requested outside order detail");
            return;
        };
        let apartment_id = order.apartment.id.clone();
        Self::api(model, caps).get_apartment(apartment_id, move |result| {
            Event::UnitApartmentFetched {
                order: Box::new(order),
                result: Box::new(result),
            }
        });
    }

    pub(super) fn unit_apartment_fetched(
        order: Order,
        result: ApiResult<Apartment>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let apartment = match result {
            Ok(apartment) => apartment,
            Err(e) => {
                Self::api_failed_with_banner(&e, model, caps);
                return;
            }
        };
        let still_viewing = Self::detail_order(model).is_some_and(|o| o.id == order.id);
        if !still_viewing {
            debug!(order_id = %order.id, "left order detail before the apartment loaded");
            return;
        }
        Self::navigate(
            Route::Unit {
                apt_id: order.apartment.id.clone(),
                bld_id: BuildingId::new(order.building.clone()),
                unit_num: order.unit.clone(),
                unit_id: order.unit_id.clone(),
                apartment: Box::new(apartment),
            },
            model,
            caps,
        );
    }

    pub(super) fn go_to_cleaner(model: &mut Model, caps: &Capabilities) {
        let cleaner = Self::detail_order(model).and_then(|o| o.cleaner);
        match cleaner {
            Some(cleaner) => Self::navigate(
                Route::Cleaner {
                    cleaner_id: cleaner.id,
                },
                model,
                caps,
            ),
            None => debug!("order has no cleaner"),
        }
    }

    pub(super) fn edit_bag_quantity(model: &mut Model, caps: &Capabilities) {
        if let Some(order) = Self::detail_order(model) {
            Self::navigate(
                Route::EditBagQuantity {
                    order: Box::new(order),
                },
                model,
                caps,
            );
        }
    }

    pub(super) fn submit_bag_quantity(input: &str, model: &mut Model, caps: &Capabilities) {
        let Route::EditBagQuantity { order } = model.nav.current() else {
            warn!("bag quantity submitted outside its screen");
            return;
        };
        let order_id = order.id.clone();

        match evaluate_bag_quantity(input, order.bag_quantity) {
            BagQuantityDecision::Rejected(e) => {
                debug!(order_id = %order_id, error = %e, "bag quantity rejected");
                model.orders.bag_quantity_error = Some(e.to_string());
            }
            BagQuantityDecision::Unchanged => {
                debug!(order_id = %order_id, "bag quantity unchanged");
                Self::navigate_back(model, caps);
            }
            BagQuantityDecision::Submit(quantity) => {
                let mutation =
                    PendingMutation::new(MutationKind::UpdateBagQuantity, order_id.as_str());
                if !model.pending.begin(mutation.clone()) {
                    debug!(order_id = %order_id, "bag quantity update already in flight");
                    return;
                }
                model.orders.bag_quantity_error = None;
                info!(order_id = %order_id, quantity, "updating bag quantity");
                Self::api(model, caps).update_bag_quantity(order_id, quantity, move |result| {
                    Event::OrderMutated {
                        mutation,
                        result: Box::new(result),
                    }
                });
            }
        }
    }

    pub(super) fn order_mutated(
        mutation: &PendingMutation,
        result: ApiResult<Order>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.pending.finish(mutation);
        match mutation.kind {
            MutationKind::UpdateBagQuantity => Self::bag_quantity_updated(mutation, result, model, caps),
            MutationKind::CreateOrder | MutationKind::CancelOrder | MutationKind::ClientDropoff => {
                Self::unit_mutation_settled(mutation, result, model, caps);
            }
            MutationKind::CleanerDropOff | MutationKind::PickUpOrders => {
                warn!(kind = mutation.kind.as_str(), "single-order result for a batch mutation");
            }
        }
    }

    fn bag_quantity_updated(
        mutation: &PendingMutation,
        result: ApiResult<Order>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let on_screen = matches!(
            model.nav.current(),
            Route::EditBagQuantity { order } if order.id.as_str() == mutation.target
        );
        match result {
            Ok(updated) => {
                info!(order_id = %updated.id, quantity = updated.bag_quantity, "bag quantity updated");
                if !on_screen {
                    return;
                }
                Self::navigate_back_with(model, caps, |route| {
                    if let Route::OrderDetail { order } = route {
                        if order.id == updated.id {
                            **order = updated;
                        }
                    }
                });
            }
            Err(e) => {
                Self::api_failed(&e, model, caps);
                if on_screen && !e.is_auth() {
                    model.orders.bag_quantity_error =
                        Some(AppError::from(&e).user_facing_message());
                }
            }
        }
    }

    /// Pops the current route, lets `refresh` update the route underneath,
    /// then focuses it.
    fn navigate_back_with(model: &mut Model, caps: &Capabilities, refresh: impl FnOnce(&mut Route)) {
        if let Some(below) = model.nav.below_mut() {
            refresh(below);
        }
        Self::navigate_back(model, caps);
    }
}
