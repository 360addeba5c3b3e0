use tracing::{info, warn};

use super::App;
use crate::capabilities::{read_string, Capabilities, KvResult};
use crate::config::ApiConfig;
use crate::error::{AppError, ErrorKind};
use crate::event::Event;
use crate::fetch::ScreenKey;
use crate::model::{
    ApartmentsState, CleanersState, LatLon, Loadable, Model, OrdersState, Service,
};
use crate::navigation::{Navigation, Route};
use crate::services::RequestedServices;
use crate::session::SessionAction;
use crate::REQUESTS_KEY;

impl App {
    pub(super) fn start(api_base_url: Option<String>, model: &mut Model, caps: &Capabilities) {
        model.config = match api_base_url {
            Some(url) => ApiConfig::with_override(Some(&url)),
            None => ApiConfig::from_env(),
        };
        info!(host = model.config.base_url().host(), "starting");

        let effects = model.session.apply_logged(SessionAction::Start);
        Self::run_session_effects(effects, caps);

        caps.kv.get(REQUESTS_KEY.to_string(), |r| {
            Event::RequestedServicesLoaded(Box::new(r))
        });
    }

    pub(super) fn token_loaded(result: KvResult, model: &mut Model, caps: &Capabilities) {
        let token = match read_string(result) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                None
            }
        };
        let effects = model.session.apply_logged(SessionAction::TokenLoaded(token));
        Self::run_session_effects(effects, caps);
        Self::focus(model, caps);
    }

    pub(super) fn token_persisted(result: KvResult, model: &mut Model) {
        if let Err(e) = result {
            warn!(error = %e, "failed to persist token");
        }
        model.session.apply_logged(SessionAction::PersistSettled);
    }

    pub(super) fn login(token: String, model: &mut Model, caps: &Capabilities) {
        match model.session.apply(SessionAction::Login { token }) {
            Ok(effects) => {
                model.clear_error();
                model.fetches.invalidate_all();
                Self::run_session_effects(effects, caps);
                Self::focus(model, caps);
            }
            Err(e) => {
                warn!(error = %e, "login rejected");
                model.set_error(AppError::from(e));
            }
        }
    }

    pub(super) fn logout(model: &mut Model, caps: &Capabilities) {
        let effects = model.session.apply_logged(SessionAction::Logout);
        model.fetches.invalidate_all();
        model.pending.clear();
        model.nav = Navigation::default();
        model.orders = OrdersState::default();
        model.apartments = ApartmentsState::default();
        model.cleaners = CleanersState::default();
        model.clear_error();
        Self::run_session_effects(effects, caps);
    }

    /// A denial drops the last known location along with anything found
    /// around it.
    pub(super) fn location_permission(granted: bool, model: &mut Model) {
        model.location_denied = !granted;
        if !granted {
            info!("location permission denied");
            model.session.apply_logged(SessionAction::ClearLocation);
            model.fetches.invalidate(ScreenKey::Cleaners);
            model.cleaners.nearby = Loadable::Idle;
        }
    }

    pub(super) fn location_received(lat: f64, lon: f64, model: &mut Model, caps: &Capabilities) {
        let Some(location) = LatLon::new(lat, lon) else {
            warn!(lat, lon, "ignoring invalid device location");
            model.set_error(
                AppError::new(ErrorKind::Location, "invalid coordinates")
                    .with_context("lat", lat.to_string())
                    .with_context("lon", lon.to_string()),
            );
            return;
        };
        model.location_denied = false;
        model.session.apply_logged(SessionAction::SetLocation(location));

        if matches!(model.nav.current(), Route::Cleaners) {
            Self::focus(model, caps);
        }
    }

    pub(super) fn requested_services_loaded(result: KvResult, model: &mut Model) {
        model.requested_services = RequestedServices::from_stored(result);
    }

    pub(super) fn toggle_service(service: Service, model: &mut Model, caps: &Capabilities) {
        let id = service.id.clone();
        let requested = model.requested_services.toggle(service);
        info!(service_id = %id, requested, "requested services changed");
        match model.requested_services.encode() {
            Ok(bytes) => caps.kv.set(REQUESTS_KEY.to_string(), bytes, |r| {
                Event::RequestedServicesPersisted(Box::new(r))
            }),
            Err(e) => warn!(error = %e, "could not encode requested services"),
        }
    }
}
