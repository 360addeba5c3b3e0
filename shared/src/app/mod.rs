mod apartments;
mod cleaners;
mod orders;
mod session;
mod units;

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, ApiResult, Sentinel};
use crate::capabilities::Capabilities;
use crate::error::AppError;
use crate::event::Event;
use crate::fetch::FetchTicket;
use crate::model::{Loadable, Model, UnixTimeMs};
use crate::navigation::Route;
use crate::session::{SessionAction, SessionEffect};
use crate::view::{self, ViewModel};
use crate::TOKEN_KEY;

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );
        model.now = UnixTimeMs::now();

        match event {
            Event::AppStarted { api_base_url } => Self::start(api_base_url, model, caps),
            Event::LoginCompleted { token } => Self::login(token, model, caps),
            Event::LogoutRequested => Self::logout(model, caps),
            Event::LocationPermissionResult { granted } => {
                Self::location_permission(granted, model);
            }
            Event::LocationReceived { lat, lon } => Self::location_received(lat, lon, model, caps),
            Event::DismissError => model.clear_error(),

            Event::NavigateBack => Self::navigate_back(model, caps),
            Event::SwitchTab(tab) => {
                for route in model.nav.switch_tab(tab) {
                    if let Some(screen) = route.screen() {
                        model.fetches.invalidate(screen);
                    }
                }
                Self::focus(model, caps);
            }
            Event::Refresh => Self::focus(model, caps),

            Event::OrderSelected { order_id } => Self::select_order(&order_id, model, caps),
            Event::GoToUnitRequested => Self::go_to_unit(model, caps),
            Event::GoToCleanerRequested => Self::go_to_cleaner(model, caps),
            Event::EditBagQuantityRequested => Self::edit_bag_quantity(model, caps),
            Event::BagQuantitySubmitted { input } => {
                Self::submit_bag_quantity(&input, model, caps);
            }

            Event::BuildingSelected {
                apartment_id,
                building_id,
            } => Self::select_building(&apartment_id, building_id, model, caps),
            Event::UnitSelected { unit_num } => Self::select_unit(unit_num, model, caps),
            Event::ClientSelected { client_id } => model.orders.selected_client = Some(client_id),
            Event::UnitActionRequested { client_id, action } => {
                Self::unit_action(client_id, action, model, caps);
            }

            Event::CleanerSelected { cleaner_id } => {
                Self::navigate(Route::Cleaner { cleaner_id }, model, caps);
            }
            Event::CleanerDropOffRequested => Self::open_drop_off(model, caps),
            Event::CleanerPickupsRequested => Self::open_pickups(model, caps),
            Event::OrderToggled { order_id } => {
                let selected = &mut model.cleaners.selected_orders;
                if !selected.remove(&order_id) {
                    selected.insert(order_id);
                }
            }
            Event::SubmitSelectedOrders => Self::submit_selected_orders(model, caps),
            Event::ServiceToggled { service } => Self::toggle_service(service, model, caps),

            Event::TokenLoaded(result) => Self::token_loaded(*result, model, caps),
            Event::TokenPersisted(result) => Self::token_persisted(*result, model),
            Event::RequestedServicesLoaded(result) => Self::requested_services_loaded(*result, model),
            Event::RequestedServicesPersisted(result) => {
                if let Err(e) = *result {
                    warn!(error = %e, "failed to persist requested services");
                }
            }

            Event::DriverFetched { ticket, result } => {
                Self::driver_fetched(ticket, *result, model, caps);
            }
            Event::DriverOrdersFetched { ticket, result } => {
                Self::driver_orders_fetched(ticket, *result, model, caps);
            }
            Event::UnitApartmentFetched { order, result } => {
                Self::unit_apartment_fetched(*order, *result, model, caps);
            }
            Event::UnitFetched { ticket, result } => Self::unit_fetched(ticket, *result, model, caps),
            Event::ApartmentsFetched { ticket, result } => {
                Self::apartments_fetched(ticket, *result, model, caps);
            }
            Event::ActiveUnitsFetched { ticket, result } => {
                Self::active_units_fetched(ticket, *result, model, caps);
            }
            Event::NearbyCleanersFetched { ticket, result } => {
                Self::nearby_cleaners_fetched(ticket, *result, model, caps);
            }
            Event::CleanerFetched { ticket, result } => {
                Self::cleaner_fetched(ticket, *result, model, caps);
            }
            Event::CleanerOrdersFetched { ticket, result } => {
                Self::cleaner_orders_fetched(ticket, *result, model, caps);
            }
            Event::PickupsFetched { ticket, result } => {
                Self::pickups_fetched(ticket, *result, model, caps);
            }
            Event::OrderMutated { mutation, result } => {
                Self::order_mutated(&mutation, *result, model, caps);
            }
            Event::OrdersMutated { mutation, result } => {
                Self::orders_mutated(&mutation, *result, model, caps);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::view(model)
    }
}

impl App {
    fn api<'a>(model: &'a Model, caps: &'a Capabilities) -> ApiClient<'a> {
        ApiClient::new(&caps.http, &model.config, model.session.token())
    }

    fn run_session_effects(effects: Vec<SessionEffect>, caps: &Capabilities) {
        for effect in effects {
            match effect {
                SessionEffect::LoadToken => caps
                    .kv
                    .get(TOKEN_KEY.to_string(), |r| Event::TokenLoaded(Box::new(r))),
                SessionEffect::PersistToken(Some(token)) => caps.kv.set(
                    TOKEN_KEY.to_string(),
                    token.expose_secret().as_bytes().to_vec(),
                    |r| Event::TokenPersisted(Box::new(r)),
                ),
                SessionEffect::PersistToken(None) => caps
                    .kv
                    .delete(TOKEN_KEY.to_string(), |r| Event::TokenPersisted(Box::new(r))),
            }
        }
    }

    /// Logs a failed call and, for an authorization failure, invalidates
    /// the session.
    fn api_failed(error: &ApiError, model: &mut Model, caps: &Capabilities) {
        warn!(
            endpoint = %error.endpoint,
            kind = ?error.kind,
            status = ?error.status,
            error = %error.message,
            "request failed"
        );
        Self::invalidate_on_auth(error, model, caps);
    }

    /// An authorization failure ends the session and abandons every
    /// outstanding fetch.
    fn invalidate_on_auth(error: &ApiError, model: &mut Model, caps: &Capabilities) {
        if !error.is_auth() {
            return;
        }
        let effects = model.session.apply_logged(SessionAction::Invalidate);
        if !effects.is_empty() {
            model.fetches.invalidate_all();
            model.set_error(AppError::from(error));
        }
        Self::run_session_effects(effects, caps);
    }

    /// Like [`Self::api_failed`], and also shows the failure as a banner.
    fn api_failed_with_banner(error: &ApiError, model: &mut Model, caps: &Capabilities) {
        Self::api_failed(error, model, caps);
        if !error.is_auth() {
            model.set_error(AppError::from(error));
        }
    }

    /// Unwraps `result` into `slot`. A failure is recorded as `Failed` and
    /// handed to [`Self::api_failed`].
    fn settle<T>(
        result: ApiResult<T>,
        slot: fn(&mut Model) -> &mut Loadable<T>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(value) => *slot(model) = Loadable::Ready(value),
            Err(e) => {
                Self::api_failed(&e, model, caps);
                *slot(model) = Loadable::Failed(e);
            }
        }
    }

    /// Like [`Self::settle`], but a failure leaves an empty value behind.
    fn settle_or_empty<T: Default>(
        result: ApiResult<T>,
        slot: fn(&mut Model) -> &mut Loadable<T>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let auth_failure = result.as_ref().err().filter(|e| e.is_auth()).cloned();
        *slot(model) = Loadable::Ready(result.or_empty());
        if let Some(e) = auth_failure {
            Self::invalidate_on_auth(&e, model, caps);
        }
    }

    fn navigate(route: Route, model: &mut Model, caps: &Capabilities) {
        model.nav.push(route);
        Self::focus(model, caps);
    }

    fn navigate_back(model: &mut Model, caps: &Capabilities) {
        let Some(left) = model.nav.pop() else {
            return;
        };
        if let Some(screen) = left.screen() {
            model.fetches.invalidate(screen);
        }
        if matches!(left, Route::EditBagQuantity { .. }) {
            model.orders.bag_quantity_error = None;
        }
        Self::focus(model, caps);
    }

    /// Runs the fetches the current screen needs. Every call supersedes the
    /// screen's earlier fetches.
    fn focus(model: &mut Model, caps: &Capabilities) {
        if !model.session.phase().is_authenticated() {
            debug!(route = model.nav.current().name(), "not signed in, skipping fetch");
            return;
        }

        let route = model.nav.current().clone();
        let Some(screen) = route.screen() else {
            if matches!(route, Route::EditBagQuantity { .. }) {
                model.orders.bag_quantity_error = None;
            }
            return;
        };
        let ticket = model.fetches.issue(screen);
        debug!(route = route.name(), generation = ticket.generation, "focus");

        match route {
            Route::ActiveOrders => Self::focus_active_orders(ticket, model, caps),
            Route::OrderDetail { .. } => Self::fetch_held_orders(ticket, model, caps),
            Route::Unit { unit_id, .. } => Self::focus_unit(ticket, unit_id, model, caps),
            Route::Apartments => Self::focus_apartments(ticket, model, caps),
            Route::Building { apt_id, bld_id, .. } => {
                Self::focus_building(ticket, apt_id, bld_id, model, caps);
            }
            Route::Cleaners => Self::focus_cleaners(ticket, model, caps),
            Route::Cleaner { cleaner_id } => Self::focus_cleaner(ticket, cleaner_id, model, caps),
            Route::CleanerDropOff { .. } => {
                model.cleaners.selected_orders.clear();
                Self::fetch_held_orders(ticket, model, caps);
            }
            Route::CleanerPickups { cleaner_id, .. } => {
                Self::focus_pickups(ticket, cleaner_id, model, caps);
            }
            Route::EditBagQuantity { .. } | Route::Account => {}
        }
    }

    /// Fetches the orders the driver currently holds for `ticket`'s screen.
    fn fetch_held_orders(ticket: FetchTicket, model: &mut Model, caps: &Capabilities) {
        model.orders.held_orders = Loadable::Loading;
        Self::api(model, caps).get_driver_active_orders(move |result| {
            Event::DriverOrdersFetched {
                ticket,
                result: Box::new(result),
            }
        });
    }
}
