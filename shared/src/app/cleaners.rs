use tracing::{debug, info, warn};

use super::App;
use crate::api::ApiResult;
use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::fetch::FetchTicket;
use crate::model::{Cleaner, CleanerId, Loadable, Model, Order, OrderId};
use crate::mutation::{MutationKind, PendingMutation};
use crate::navigation::Route;
use crate::DEFAULT_CLEANER_SEARCH_MILES;

impl App {
    /// Without a device location there is nothing to search around.
    pub(super) fn focus_cleaners(ticket: FetchTicket, model: &mut Model, caps: &Capabilities) {
        let Some(location) = model.session.location() else {
            debug!("no location yet, not searching for cleaners");
            model.cleaners.nearby = Loadable::Idle;
            return;
        };
        model.cleaners.nearby = Loadable::Loading;
        Self::api(model, caps).get_nearby_cleaners(
            location,
            f64::from(DEFAULT_CLEANER_SEARCH_MILES),
            move |result| Event::NearbyCleanersFetched {
                ticket,
                result: Box::new(result),
            },
        );
    }

    pub(super) fn nearby_cleaners_fetched(
        ticket: FetchTicket,
        result: ApiResult<Vec<Cleaner>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "nearby_cleaners") {
            Self::settle_or_empty(result, |m| &mut m.cleaners.nearby, model, caps);
        }
    }

    pub(super) fn focus_cleaner(
        ticket: FetchTicket,
        cleaner_id: CleanerId,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.cleaners.cleaner = Loadable::Loading;
        model.cleaners.cleaner_orders = Loadable::Loading;
        let api = Self::api(model, caps);
        api.get_cleaner(cleaner_id.clone(), move |result| Event::CleanerFetched {
            ticket,
            result: Box::new(result),
        });
        api.get_cleaner_active_orders(cleaner_id, move |result| Event::CleanerOrdersFetched {
            ticket,
            result: Box::new(result),
        });
    }

    pub(super) fn cleaner_fetched(
        ticket: FetchTicket,
        result: ApiResult<Cleaner>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "cleaner") {
            Self::settle(result, |m| &mut m.cleaners.cleaner, model, caps);
        }
    }

    pub(super) fn cleaner_orders_fetched(
        ticket: FetchTicket,
        result: ApiResult<Vec<Order>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "cleaner_orders") {
            Self::settle(result, |m| &mut m.cleaners.cleaner_orders, model, caps);
        }
    }

    /// The cleaner on screen, once it has loaded.
    fn viewed_cleaner(model: &Model) -> Option<(CleanerId, String)> {
        let Route::Cleaner { cleaner_id } = model.nav.current() else {
            return None;
        };
        model
            .cleaners
            .cleaner
            .ready()
            .filter(|c| &c.id == cleaner_id)
            .map(|c| (c.id.clone(), c.name.clone()))
    }

    pub(super) fn open_drop_off(model: &mut Model, caps: &Capabilities) {
        match Self::viewed_cleaner(model) {
            Some((cleaner_id, cleaner_name)) => Self::navigate(
                Route::CleanerDropOff {
                    cleaner_id,
                    cleaner_name,
                },
                model,
                caps,
            ),
            None => warn!("drop-off requested before the cleaner loaded"),
        }
    }

    pub(super) fn open_pickups(model: &mut Model, caps: &Capabilities) {
        match Self::viewed_cleaner(model) {
            Some((cleaner_id, cleaner_name)) => Self::navigate(
                Route::CleanerPickups {
                    cleaner_id,
                    cleaner_name,
                },
                model,
                caps,
            ),
            None => warn!("pickups requested before the cleaner loaded"),
        }
    }

    pub(super) fn focus_pickups(
        ticket: FetchTicket,
        cleaner_id: CleanerId,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.cleaners.selected_orders.clear();
        model.cleaners.pickups = Loadable::Loading;
        Self::api(model, caps).get_cleaner_pickups(cleaner_id, move |result| {
            Event::PickupsFetched {
                ticket,
                result: Box::new(result),
            }
        });
    }

    pub(super) fn pickups_fetched(
        ticket: FetchTicket,
        result: ApiResult<Vec<Order>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "pickups") {
            Self::settle(result, |m| &mut m.cleaners.pickups, model, caps);
        }
    }

    /// Selected ids that are still in `source`, in listing order.
    fn selected_from(source: &Loadable<Vec<Order>>, model: &Model) -> Vec<OrderId> {
        source
            .ready()
            .map(|orders| {
                orders
                    .iter()
                    .filter(|o| model.cleaners.selected_orders.contains(&o.id))
                    .map(|o| o.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn submit_selected_orders(model: &mut Model, caps: &Capabilities) {
        let (kind, cleaner_id, order_ids) = match model.nav.current() {
            Route::CleanerDropOff { cleaner_id, .. } => (
                MutationKind::CleanerDropOff,
                cleaner_id.clone(),
                Self::selected_from(&model.orders.held_orders, model),
            ),
            Route::CleanerPickups { cleaner_id, .. } => (
                MutationKind::PickUpOrders,
                cleaner_id.clone(),
                Self::selected_from(&model.cleaners.pickups, model),
            ),
            route => {
                warn!(route = route.name(), "order selection submitted outside a picker");
                return;
            }
        };
        if order_ids.is_empty() {
            debug!(kind = kind.as_str(), "nothing selected");
            return;
        }

        let mutation = PendingMutation::new(kind, cleaner_id.as_str());
        if !model.pending.begin(mutation.clone()) {
            debug!(cleaner_id = %cleaner_id, kind = kind.as_str(), "already in flight");
            return;
        }
        info!(
            cleaner_id = %cleaner_id,
            count = order_ids.len(),
            kind = kind.as_str(),
            "submitting selected orders"
        );

        let api = Self::api(model, caps);
        let make_event = move |result: ApiResult<Vec<Order>>| Event::OrdersMutated {
            mutation,
            result: Box::new(result),
        };
        match kind {
            MutationKind::CleanerDropOff => api.cleaner_drop_off(cleaner_id, order_ids, make_event),
            _ => api.pick_up_orders(cleaner_id, order_ids, make_event),
        }
    }

    /// Clears the selection and, if the picker is still open, loads its
    /// list again so handed-over orders drop out of it.
    pub(super) fn orders_mutated(
        mutation: &PendingMutation,
        result: ApiResult<Vec<Order>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.pending.finish(mutation);
        match result {
            Ok(orders) => info!(
                kind = mutation.kind.as_str(),
                cleaner_id = %mutation.target,
                count = orders.len(),
                "orders handed over"
            ),
            Err(e) => Self::api_failed_with_banner(&e, model, caps),
        }
        model.cleaners.selected_orders.clear();

        let still_open = match (mutation.kind, model.nav.current()) {
            (MutationKind::CleanerDropOff, Route::CleanerDropOff { cleaner_id, .. })
            | (MutationKind::PickUpOrders, Route::CleanerPickups { cleaner_id, .. }) => {
                cleaner_id.as_str() == mutation.target
            }
            _ => false,
        };
        if still_open {
            Self::focus(model, caps);
        }
    }
}
