use tracing::{debug, info, warn};

use super::App;
use crate::api::ApiResult;
use crate::capabilities::Capabilities;
use crate::error::{AppError, ErrorKind};
use crate::event::Event;
use crate::fetch::FetchTicket;
use crate::model::{ClientId, Loadable, Model, Order, UnitId, UnitResponse};
use crate::mutation::{MutationKind, PendingMutation};
use crate::navigation::Route;
use crate::reconcile::{UnitAction, UnitReconciliation};

/// A mutation chosen from the unit screen, resolved to the ids it needs.
enum UnitRequest {
    Create { unit_id: UnitId, email: String },
    Cancel(Order),
    DropOff(Order),
    View(Order),
}

impl App {
    /// Unit and held orders load side by side under one ticket.
    pub(super) fn focus_unit(
        ticket: FetchTicket,
        unit_id: UnitId,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.orders.unit = Loadable::Loading;
        Self::fetch_held_orders(ticket, model, caps);
        Self::api(model, caps).get_unit(unit_id, move |result| Event::UnitFetched {
            ticket,
            result: Box::new(result),
        });
    }

    pub(super) fn unit_fetched(
        ticket: FetchTicket,
        result: ApiResult<UnitResponse>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.fetches.accept(ticket, "unit") {
            Self::settle(result, |m| &mut m.orders.unit, model, caps);
        }
    }

    fn resolve_unit_request(
        client_id: &ClientId,
        action: UnitAction,
        model: &Model,
    ) -> Result<UnitRequest, AppError> {
        let Some(unit) = model.orders.unit.ready() else {
            return Err(AppError::new(ErrorKind::InvalidState, "The unit has not loaded yet"));
        };
        let held = model
            .orders
            .held_orders
            .ready()
            .map(Vec::as_slice)
            .unwrap_or_default();
        let reconciliation = UnitReconciliation::new(unit, held);

        if !reconciliation.is_allowed(client_id, action) {
            return Err(AppError::new(
                ErrorKind::InvalidState,
                "That action is not available for this client",
            )
            .with_context("client_id", client_id.as_str())
            .with_context("status", reconciliation.status_label(client_id)));
        }

        let order = || reconciliation.order_for_client(client_id).cloned();
        let missing_order = || {
            AppError::new(ErrorKind::InvalidState, "The client has no active order")
                .with_context("client_id", client_id.as_str())
        };

        match action {
            UnitAction::CreateOrder => {
                let email = reconciliation
                    .client(client_id)
                    .map(|c| c.email.trim().to_string())
                    .filter(|email| !email.is_empty())
                    .ok_or_else(|| {
                        AppError::new(ErrorKind::Validation, "The client has no email address")
                            .with_context("client_id", client_id.as_str())
                    })?;
                Ok(UnitRequest::Create {
                    unit_id: unit.unit_id.clone(),
                    email,
                })
            }
            UnitAction::CancelOrder => order().map(UnitRequest::Cancel).ok_or_else(missing_order),
            UnitAction::DropOffOrder => order().map(UnitRequest::DropOff).ok_or_else(missing_order),
            UnitAction::ViewOrder => order().map(UnitRequest::View).ok_or_else(missing_order),
        }
    }

    pub(super) fn unit_action(
        client_id: ClientId,
        action: UnitAction,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if !matches!(model.nav.current(), Route::Unit { .. }) {
            warn!(action = ?action, "unit action outside the unit screen");
            return;
        }
        model.orders.selected_client = Some(client_id.clone());

        let request = match Self::resolve_unit_request(&client_id, action, model) {
            Ok(request) => request,
            Err(e) => {
                warn!(client_id = %client_id, action = ?action, error = %e, "unit action refused");
                model.set_error(e);
                return;
            }
        };

        let (mutation, order_id) = match &request {
            UnitRequest::View(order) => {
                let order = Box::new(order.clone());
                Self::navigate(Route::OrderDetail { order }, model, caps);
                return;
            }
            UnitRequest::Create { .. } => (
                PendingMutation::new(MutationKind::CreateOrder, client_id.as_str()),
                None,
            ),
            UnitRequest::Cancel(order) => (
                PendingMutation::new(MutationKind::CancelOrder, order.id.as_str()),
                Some(order.id.clone()),
            ),
            UnitRequest::DropOff(order) => (
                PendingMutation::new(MutationKind::ClientDropoff, order.id.as_str()),
                Some(order.id.clone()),
            ),
        };

        if !model.pending.begin(mutation.clone()) {
            debug!(client_id = %client_id, kind = mutation.kind.as_str(), "already in flight");
            return;
        }
        info!(
            client_id = %client_id,
            order_id = ?order_id,
            kind = mutation.kind.as_str(),
            "submitting unit action"
        );

        let api = Self::api(model, caps);
        let make_event = move |result: ApiResult<Order>| Event::OrderMutated {
            mutation,
            result: Box::new(result),
        };
        match request {
            UnitRequest::Create { unit_id, email } => api.create_order(unit_id, email, make_event),
            UnitRequest::Cancel(order) => api.cancel_order(order.id, make_event),
            UnitRequest::DropOff(order) => api.client_dropoff(order.id, make_event),
            UnitRequest::View(_) => {}
        }
    }

    /// Either way the unit and held orders are fetched again; success is only
    /// visible once they come back.
    pub(super) fn unit_mutation_settled(
        mutation: &PendingMutation,
        result: ApiResult<Order>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match result {
            Ok(order) => info!(
                kind = mutation.kind.as_str(),
                order_id = %order.id,
                status = %order.status,
                "unit action applied"
            ),
            Err(e) => Self::api_failed_with_banner(&e, model, caps),
        }
        if matches!(model.nav.current(), Route::Unit { .. }) {
            Self::focus(model, caps);
        }
    }
}
