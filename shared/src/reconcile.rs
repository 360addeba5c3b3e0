//! Per-client order state for a single unit.
//!
//! A unit lists its clients and the unit's active orders; the driver's held
//! orders come from a separate fetch. Everything a unit screen shows or
//! allows is derived here from those two inputs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Client, ClientId, Order, OrderId, OrderStatus, UnitResponse};
use crate::NEEDS_AN_ORDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitAction {
    CreateOrder,
    CancelOrder,
    DropOffOrder,
    ViewOrder,
}

impl UnitAction {
    /// Whether the action changes backend order state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::ViewOrder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRow {
    pub client_id: ClientId,
    pub name: String,
    pub email: String,
    pub status: String,
    pub order_id: Option<OrderId>,
    pub held_by_driver: bool,
    pub actions: Vec<UnitAction>,
}

#[derive(Debug, Clone)]
pub struct UnitReconciliation<'a> {
    unit: &'a UnitResponse,
    held: HashSet<&'a OrderId>,
}

impl<'a> UnitReconciliation<'a> {
    pub fn new(unit: &'a UnitResponse, held_orders: &'a [Order]) -> Self {
        Self {
            unit,
            held: held_orders.iter().map(|o| &o.id).collect(),
        }
    }

    /// The first of the unit's active orders placed by `client_id`.
    ///
    /// More than one match is not expected from the backend; when it happens
    /// list order decides and the duplicate is logged.
    pub fn order_for_client(&self, client_id: &ClientId) -> Option<&'a Order> {
        let mut matches = self
            .unit
            .active_orders
            .iter()
            .filter(|o| &o.client.id == client_id);
        let first = matches.next()?;
        let extra = matches.count();
        if extra > 0 {
            warn!(
                unit_id = %self.unit.unit_id,
                client_id = %client_id,
                chosen = %first.id,
                ignored = extra,
                "client has more than one active order"
            );
        }
        Some(first)
    }

    pub fn status_label(&self, client_id: &ClientId) -> String {
        self.order_for_client(client_id)
            .map_or_else(|| NEEDS_AN_ORDER.to_string(), |o| o.status.to_string())
    }

    pub fn driver_holds_order(&self, client_id: &ClientId) -> bool {
        self.order_for_client(client_id)
            .is_some_and(|o| self.held.contains(&o.id))
    }

    pub fn allowed_actions(&self, client_id: &ClientId) -> Vec<UnitAction> {
        let Some(order) = self.order_for_client(client_id) else {
            return vec![UnitAction::CreateOrder];
        };
        let held = self.held.contains(&order.id);
        let mut actions = Vec::with_capacity(2);
        match order.status {
            OrderStatus::ClothesToCleaner if held => actions.push(UnitAction::CancelOrder),
            OrderStatus::PickedUpFromCleaner if held => actions.push(UnitAction::DropOffOrder),
            _ => {}
        }
        actions.push(UnitAction::ViewOrder);
        actions
    }

    pub fn is_allowed(&self, client_id: &ClientId, action: UnitAction) -> bool {
        self.allowed_actions(client_id).contains(&action)
    }

    pub fn client(&self, client_id: &ClientId) -> Option<&'a Client> {
        self.unit.client(client_id)
    }

    pub fn rows(&self) -> Vec<ClientRow> {
        self.unit
            .clients
            .iter()
            .map(|client| {
                let order = self.order_for_client(&client.id);
                ClientRow {
                    client_id: client.id.clone(),
                    name: client.full_name(),
                    email: client.email.clone(),
                    status: order.map_or_else(|| NEEDS_AN_ORDER.to_string(), |o| o.status.to_string()),
                    order_id: order.map(|o| o.id.clone()),
                    held_by_driver: order.is_some_and(|o| self.held.contains(&o.id)),
                    actions: self.allowed_actions(&client.id),
                }
            })
            .collect()
    }
}
