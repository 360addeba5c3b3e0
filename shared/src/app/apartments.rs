use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::App;
use crate::api::ApiResult;
use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::fetch::FetchTicket;
use crate::model::{Apartment, ApartmentId, BuildingId, Loadable, Model, Unit};
use crate::navigation::Route;

impl App {
    pub(super) fn focus_apartments(ticket: FetchTicket, model: &mut Model, caps: &Capabilities) {
        model.apartments.apartments = Loadable::Loading;
        Self::api(model, caps).get_apartments(move |result| Event::ApartmentsFetched {
            ticket,
            result: Box::new(result),
        });
    }

    pub(super) fn apartments_fetched(
        ticket: FetchTicket,
        result: ApiResult<Vec<Apartment>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "apartments") {
            Self::settle_or_empty(result, |m| &mut m.apartments.apartments, model, caps);
        }
    }

    pub(super) fn select_building(
        apartment_id: &ApartmentId,
        building_id: BuildingId,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let apartment = model
            .apartments
            .apartments
            .ready()
            .and_then(|list| list.iter().find(|a| &a.id == apartment_id))
            .cloned();
        let Some(apartment) = apartment else {
            warn!(apartment_id = %apartment_id, "selected apartment is not listed");
            return;
        };
        if !apartment.buildings.contains_key(building_id.as_str()) {
            warn!(
                apartment_id = %apartment_id,
                building_id = %building_id,
                "apartment has no such building"
            );
            return;
        }

        Self::navigate(
            Route::Building {
                apt_id: apartment_id.clone(),
                bld_id: building_id,
                apartment: Box::new(apartment),
            },
            model,
            caps,
        );
    }

    pub(super) fn focus_building(
        ticket: FetchTicket,
        apartment_id: ApartmentId,
        building_id: BuildingId,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.apartments.active_units = Loadable::Loading;
        Self::api(model, caps).get_active_units(apartment_id, building_id, move |result| {
            Event::ActiveUnitsFetched {
                ticket,
                result: Box::new(result),
            }
        });
    }

    pub(super) fn active_units_fetched(
        ticket: FetchTicket,
        result: ApiResult<BTreeMap<String, Unit>>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "active_units") {
            Self::settle(result, |m| &mut m.apartments.active_units, model, caps);
        }
    }

    /// Opens a unit listed on the building screen. Units the server returns
    /// without an id cannot be opened.
    pub(super) fn select_unit(unit_num: String, model: &mut Model, caps: &Capabilities) {
        let Route::Building {
            apt_id,
            bld_id,
            apartment,
        } = model.nav.current()
        else {
            warn!(unit_num = %unit_num, "unit selected outside a building");
            return;
        };

        let unit_id = model
            .apartments
            .active_units
            .ready()
            .and_then(|units| units.get(&unit_num))
            .and_then(|unit| unit.unit_id.clone());
        let Some(unit_id) = unit_id else {
            debug!(unit_num = %unit_num, building_id = %bld_id, "unit has no id yet");
            return;
        };

        let route = Route::Unit {
            apt_id: apt_id.clone(),
            bld_id: bld_id.clone(),
            unit_num,
            unit_id,
            apartment: apartment.clone(),
        };
        Self::navigate(route, model, caps);
    }
}
