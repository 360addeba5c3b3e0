mod support;

use assert_matches::assert_matches;
use serde_json::json;

use driver_core::capabilities::{HttpResponse, HttpResult, KeyValueOperation};
use driver_core::model::{ApartmentId, BuildingId, CleanerId, ClientId, OrderId};
use driver_core::navigation::Tab;
use driver_core::reconcile::UnitAction;
use driver_core::session::SessionPhase;
use driver_core::view::{
    ActiveOrdersView, ScreenView, UnitView, ORDERS_FAILED_MESSAGE, UNITS_FAILED_MESSAGE,
};
use driver_core::{Event, LOCATION_REQUIRED_MESSAGE, NEEDS_AN_ORDER, NO_ORDERS_MESSAGE};

use support::{apartment, client, driver, order, Shell, API};

fn start() -> Shell {
    let mut shell = Shell::new();
    shell.send(Event::AppStarted {
        api_base_url: Some(API.to_string()),
    });
    shell
}

#[test]
fn empty_stored_token_shows_login_without_requests() {
    let mut shell = start();
    assert_matches!(shell.screen(), ScreenView::Loading);

    shell.resolve_kv_get("requests", None);
    shell.resolve_kv_get("token", Some(""));

    assert_matches!(shell.screen(), ScreenView::Login);
    assert_eq!(shell.model.session.phase(), SessionPhase::Unauthenticated);
    assert!(shell.pending_paths().is_empty());
}

#[test]
fn stored_token_loads_active_orders() {
    let mut shell = Shell::signed_in();
    assert!(shell.model.session.phase().is_authenticated());
    assert_matches!(
        shell.screen(),
        ScreenView::ActiveOrders(ActiveOrdersView::Loading)
    );

    let request = shell.take_http("driver");
    assert_eq!(request.operation.method, "GET");
    assert_eq!(
        support::header(&request.operation, "Authorization"),
        Some("Bearer tok-123")
    );
    shell.resolve_http(request, HttpResult::Ok(HttpResponse::ok().json(driver()).build()));

    let orders = json!([order("o1", "Clothes To Cleaner", client("c1", "Ann", "ann@x.io"))]);
    shell.respond_json("driver/order/active_orders", 200, &orders);

    assert_matches!(
        shell.screen(),
        ScreenView::ActiveOrders(ActiveOrdersView::Orders { orders }) if orders.len() == 1
    );
}

#[test]
fn failed_order_list_reads_as_no_orders() {
    let mut shell = Shell::signed_in();
    shell.respond_json("driver", 200, &driver());
    shell.respond_error("driver/order/active_orders", 500);

    assert_eq!(
        shell.screen(),
        ScreenView::ActiveOrders(ActiveOrdersView::Empty {
            message: NO_ORDERS_MESSAGE.to_string()
        })
    );
}

#[test]
fn failed_driver_fetch_shows_error_state() {
    let mut shell = Shell::signed_in();
    shell.respond_error("driver", 500);

    assert_matches!(
        shell.screen(),
        ScreenView::ActiveOrders(ActiveOrdersView::Error)
    );
    assert!(!shell.has_request("driver/order/active_orders"));
}

#[test]
fn superseded_response_is_dropped() {
    let mut shell = Shell::signed_in();
    shell.send(Event::Refresh);

    // Two driver requests are in flight; the first belongs to a stale ticket.
    let stale = shell.take_http("driver");
    shell.resolve_http(stale, HttpResult::Ok(HttpResponse::ok().json(driver()).build()));
    assert!(!shell.has_request("driver/order/active_orders"));

    shell.respond_json("driver", 200, &driver());
    assert!(shell.has_request("driver/order/active_orders"));
}

#[test]
fn unauthorized_response_invalidates_session() {
    let mut shell = Shell::signed_in();
    shell.respond_error("driver", 401);

    assert_eq!(shell.model.session.phase(), SessionPhase::Invalidated);
    assert_matches!(shell.screen(), ScreenView::Login);
    assert!(shell.view().error.is_some());
    assert!(shell.model.session.token().is_none());

    shell.resolve_kv_delete("token");
    assert_eq!(shell.model.session.phase(), SessionPhase::Unauthenticated);
}

#[test]
fn login_persists_token_and_fetches() {
    let mut shell = start();
    shell.resolve_kv_get("token", None);
    assert_matches!(shell.screen(), ScreenView::Login);

    shell.send(Event::LoginCompleted {
        token: "fresh".to_string(),
    });

    assert!(shell.model.session.phase().is_authenticated());
    assert!(shell.has_request("driver"));
    assert!(shell
        .kv_pending()
        .iter()
        .any(|op| matches!(op, KeyValueOperation::Set { key, value } if key == "token" && value == b"fresh")));
}

#[test]
fn logout_clears_token_and_state() {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Apartments));
    shell.send(Event::LogoutRequested);

    assert_matches!(shell.screen(), ScreenView::Login);
    assert_eq!(shell.view().tab, Tab::ActiveOrders);
    assert!(shell
        .kv_pending()
        .iter()
        .any(|op| matches!(op, KeyValueOperation::Delete { key } if key == "token")));
}

/// Opens the unit screen for unit 101 of building b1 and answers its two
/// fetches.
fn open_unit(held: serde_json::Value, unit: serde_json::Value) -> Shell {
    open_unit_with_id("u1", held, unit)
}

fn open_unit_with_id(unit_id: &str, held: serde_json::Value, unit: serde_json::Value) -> Shell {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Apartments));
    shell.respond_json("driver/apartments", 200, &json!([apartment()]));

    shell.send(Event::BuildingSelected {
        apartment_id: ApartmentId::new("apt1"),
        building_id: BuildingId::new("b1"),
    });
    shell.respond_json(
        "driver/apartment/apt1/b1/active_units",
        200,
        &json!({ "101": { "unitId": unit_id, "clients": [], "activeOrders": [] } }),
    );

    shell.send(Event::UnitSelected {
        unit_num: "101".to_string(),
    });
    shell.respond_json("driver/order/active_orders", 200, &held);
    shell.respond_json(&format!("driver/apartment/unitId/{unit_id}"), 200, &unit);
    shell
}

#[test]
fn unit_create_order_refetches_unit() {
    let ann = client("c1", "Ann", "ann@x.io");
    let unit = json!({ "unitId": "u1", "clients": [ann.clone()], "activeOrders": [] });
    let mut shell = open_unit(json!([]), unit);

    assert_matches!(
        shell.screen(),
        ScreenView::Unit(UnitView::Ready { rows, .. })
            if rows[0].actions == vec![UnitAction::CreateOrder]
    );

    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::CreateOrder,
    });
    let path = shell
        .pending_paths()
        .into_iter()
        .find(|p| p.starts_with("driver/order/client_create/u1/"))
        .expect("create order request");
    assert_matches!(
        shell.screen(),
        ScreenView::Unit(UnitView::Ready { busy: true, .. })
    );

    shell.respond_json(&path, 200, &order("o9", "Clothes To Cleaner", ann));

    assert!(shell.has_request("driver/apartment/unitId/u1"));
    assert!(shell.has_request("driver/order/active_orders"));
    assert!(shell.model.pending.is_empty());
}

#[test]
fn created_order_shows_up_after_refetch() {
    let client_a = client("c1", "Ann", "a@b.com");
    let unit = json!({ "unitId": "U1", "clients": [client_a.clone()], "activeOrders": [] });
    let mut shell = open_unit_with_id("U1", json!([]), unit);

    assert_matches!(
        shell.screen(),
        ScreenView::Unit(UnitView::Ready { rows, .. }) if rows[0].status == NEEDS_AN_ORDER
    );

    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::CreateOrder,
    });
    let mut created = order("o9", "Clothes To Cleaner", client_a.clone());
    created["unitId"] = json!("U1");
    shell.respond_json("driver/order/client_create/U1/a@b.com", 200, &created);

    let refetched = json!({ "unitId": "U1", "clients": [client_a], "activeOrders": [created.clone()] });
    shell.respond_json("driver/order/active_orders", 200, &json!([created]));
    shell.respond_json("driver/apartment/unitId/U1", 200, &refetched);

    let ScreenView::Unit(UnitView::Ready { rows, busy, .. }) = shell.screen() else {
        panic!("expected the unit screen");
    };
    assert!(!busy);
    assert_ne!(rows[0].status, NEEDS_AN_ORDER);
    assert_eq!(rows[0].order_id, Some(OrderId::new("o9")));
    assert!(rows[0].held_by_driver);
    assert_eq!(
        rows[0].actions,
        vec![UnitAction::CancelOrder, UnitAction::ViewOrder]
    );
}

#[test]
fn held_order_back_from_cleaner_can_be_dropped_off() {
    let ann = client("c1", "Ann", "ann@x.io");
    let returned = order("o1", "Picked Up From Cleaner", ann.clone());
    let unit = json!({ "unitId": "u1", "clients": [ann], "activeOrders": [returned.clone()] });
    let mut shell = open_unit(json!([returned.clone()]), unit);

    assert_matches!(
        shell.screen(),
        ScreenView::Unit(UnitView::Ready { rows, .. })
            if rows[0].actions == vec![UnitAction::DropOffOrder, UnitAction::ViewOrder]
    );

    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::DropOffOrder,
    });
    let request = shell.take_http("driver/order/o1/client_dropoff");
    assert_eq!(request.operation.method, "POST");
    assert!(!shell.has_request("driver/apartment/unitId/u1"));

    let mut dropped = returned;
    dropped["status"] = json!("Dropped Off");
    shell.resolve_http(request, HttpResult::Ok(HttpResponse::ok().json(dropped).build()));

    assert!(shell.has_request("driver/apartment/unitId/u1"));
    assert!(shell.has_request("driver/order/active_orders"));
    assert!(shell.model.pending.is_empty());
    assert!(shell.view().error.is_none());
}

#[test]
fn drop_off_is_not_offered_for_orders_held_by_someone_else() {
    let ann = client("c1", "Ann", "ann@x.io");
    let returned = order("o1", "Picked Up From Cleaner", ann.clone());
    let unit = json!({ "unitId": "u1", "clients": [ann], "activeOrders": [returned] });
    let mut shell = open_unit(json!([]), unit);

    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::DropOffOrder,
    });
    assert!(!shell.has_request("driver/order/o1/client_dropoff"));
    assert!(shell.view().error.is_some());
}

#[test]
fn cancel_is_offered_only_for_held_orders() {
    let ann = client("c1", "Ann", "ann@x.io");
    let placed = order("o1", "Clothes To Cleaner", ann.clone());
    let unit = json!({ "unitId": "u1", "clients": [ann], "activeOrders": [placed.clone()] });

    let mut shell = open_unit(json!([]), unit.clone());
    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::CancelOrder,
    });
    assert!(!shell.has_request("driver/order/o1/cancel_order"));
    assert!(shell.view().error.is_some());

    let mut shell = open_unit(json!([placed]), unit);
    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::CancelOrder,
    });
    assert!(shell.has_request("driver/order/o1/cancel_order"));

    // A second tap while the first is in flight sends nothing new.
    shell.send(Event::UnitActionRequested {
        client_id: ClientId::new("c1"),
        action: UnitAction::CancelOrder,
    });
    let cancels = shell
        .pending_paths()
        .into_iter()
        .filter(|p| p == "driver/order/o1/cancel_order")
        .count();
    assert_eq!(cancels, 1);
}

#[test]
fn unit_fetch_failure_shows_message() {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Apartments));
    shell.respond_json("driver/apartments", 200, &json!([apartment()]));
    shell.send(Event::BuildingSelected {
        apartment_id: ApartmentId::new("apt1"),
        building_id: BuildingId::new("b1"),
    });
    shell.respond_json(
        "driver/apartment/apt1/b1/active_units",
        200,
        &json!({ "101": { "unitId": "u1" } }),
    );
    shell.send(Event::UnitSelected {
        unit_num: "101".to_string(),
    });
    shell.respond_error("driver/apartment/unitId/u1", 404);

    assert_matches!(
        shell.screen(),
        ScreenView::Unit(UnitView::Failed { message }) if message == "Could not get unit"
    );
}

fn open_bag_quantity() -> Shell {
    let mut shell = Shell::signed_in();
    shell.respond_json("driver", 200, &driver());
    let orders = json!([order("o1", "Clothes To Cleaner", client("c1", "Ann", "ann@x.io"))]);
    shell.respond_json("driver/order/active_orders", 200, &orders);

    shell.send(Event::OrderSelected {
        order_id: OrderId::new("o1"),
    });
    assert_matches!(shell.screen(), ScreenView::OrderDetail(_));
    shell.respond_json("driver/order/active_orders", 200, &orders);

    shell.send(Event::EditBagQuantityRequested);
    assert_matches!(shell.screen(), ScreenView::EditBagQuantity(_));
    shell
}

#[test]
fn bag_quantity_rejects_non_numbers_without_request() {
    let mut shell = open_bag_quantity();
    shell.send(Event::BagQuantitySubmitted {
        input: "two".to_string(),
    });

    assert!(shell.pending_paths().iter().all(|p| !p.contains("bagquantity")));
    assert_matches!(
        shell.screen(),
        ScreenView::EditBagQuantity(view) if view.error.is_some()
    );
}

#[test]
fn unchanged_bag_quantity_goes_back_without_request() {
    let mut shell = open_bag_quantity();
    shell.send(Event::BagQuantitySubmitted {
        input: " 2 ".to_string(),
    });

    assert!(shell.pending_paths().iter().all(|p| !p.contains("bagquantity")));
    assert_matches!(shell.screen(), ScreenView::OrderDetail(_));
}

#[test]
fn bag_quantity_update_returns_to_updated_detail() {
    let mut shell = open_bag_quantity();
    shell.send(Event::BagQuantitySubmitted {
        input: "5".to_string(),
    });

    let mut updated = order("o1", "Clothes To Cleaner", client("c1", "Ann", "ann@x.io"));
    updated["bagQuantity"] = json!(5);
    shell.respond_json("driver/order/bagquantity/o1/5", 200, &updated);

    assert_matches!(
        shell.screen(),
        ScreenView::OrderDetail(view) if view.order.bag_quantity == 5
    );
}

#[test]
fn failed_bag_quantity_update_stays_on_editor_with_error() {
    let mut shell = open_bag_quantity();
    shell.send(Event::BagQuantitySubmitted {
        input: "5".to_string(),
    });
    shell.respond_error("driver/order/bagquantity/o1/5", 500);

    let ScreenView::EditBagQuantity(view) = shell.screen() else {
        panic!("expected the bag quantity editor");
    };
    assert!(view.error.is_some());
    assert!(!view.submitting);
    assert_eq!(view.current, 2);
    assert!(shell.model.pending.is_empty());
}

#[test]
fn cleaners_need_a_location() {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Cleaners));
    assert!(!shell.has_request("client/cleaners_nearby"));
    assert_matches!(
        shell.screen(),
        ScreenView::Cleaners(view) if view.message.is_some()
    );

    shell.send(Event::LocationReceived {
        lat: 40.7,
        lon: -74.0,
    });
    assert!(shell.has_request("client/cleaners_nearby"));
}

fn open_building() -> Shell {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Apartments));
    shell.respond_json("driver/apartments", 200, &json!([apartment()]));
    shell.send(Event::BuildingSelected {
        apartment_id: ApartmentId::new("apt1"),
        building_id: BuildingId::new("b1"),
    });
    shell
}

#[test]
fn failed_unit_list_differs_from_empty_building() {
    let mut shell = open_building();
    shell.respond_error("driver/apartment/apt1/b1/active_units", 500);
    let ScreenView::Building(failed) = shell.screen() else {
        panic!("expected the building screen");
    };
    assert_eq!(failed.error.as_deref(), Some(UNITS_FAILED_MESSAGE));
    assert!(failed.units.is_empty());

    let mut shell = open_building();
    shell.respond_json("driver/apartment/apt1/b1/active_units", 200, &json!({}));
    let ScreenView::Building(empty) = shell.screen() else {
        panic!("expected the building screen");
    };
    assert_eq!(empty.error, None);
    assert!(empty.units.is_empty());
    assert!(!empty.loading);
}

/// Finds cleaner cl1 nearby and opens it.
fn open_cleaner() -> Shell {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Cleaners));
    shell.send(Event::LocationReceived {
        lat: 40.7,
        lon: -74.0,
    });
    let fresh_press = json!({ "_id": "cl1", "name": "Fresh Press" });
    shell.respond_json("client/cleaners_nearby", 200, &json!([fresh_press.clone()]));

    shell.send(Event::CleanerSelected {
        cleaner_id: CleanerId::new("cl1"),
    });
    shell.respond_json("driver/cleaner/cl1", 200, &fresh_press);
    shell
}

#[test]
fn failed_cleaner_orders_show_error() {
    let mut shell = open_cleaner();
    shell.respond_error("driver/cleaner/cl1/active_orders", 500);

    let ScreenView::Cleaner(view) = shell.screen() else {
        panic!("expected the cleaner screen");
    };
    assert_eq!(view.error.as_deref(), Some(ORDERS_FAILED_MESSAGE));
    assert!(view.cleaner.is_some());
    assert!(view.orders.is_empty());
}

#[test]
fn cleaner_without_orders_has_no_error() {
    let mut shell = open_cleaner();
    shell.respond_json("driver/cleaner/cl1/active_orders", 200, &json!([]));

    assert_matches!(
        shell.screen(),
        ScreenView::Cleaner(view) if view.error.is_none() && view.orders.is_empty()
    );
}

#[test]
fn failed_pickups_show_error() {
    let mut shell = open_cleaner();
    shell.respond_json("driver/cleaner/cl1/active_orders", 200, &json!([]));
    shell.send(Event::CleanerPickupsRequested);
    shell.respond_error("driver/cleaner/cl1/pickups", 500);

    let ScreenView::CleanerPickups(view) = shell.screen() else {
        panic!("expected the pickups picker");
    };
    assert_eq!(view.error.as_deref(), Some(ORDERS_FAILED_MESSAGE));
    assert!(view.orders.is_empty());
    assert!(!view.can_submit);
}

#[test]
fn denied_location_forgets_last_fix() {
    let mut shell = Shell::signed_in();
    shell.send(Event::SwitchTab(Tab::Cleaners));
    shell.send(Event::LocationReceived {
        lat: 40.7,
        lon: -74.0,
    });
    shell.respond_json(
        "client/cleaners_nearby",
        200,
        &json!([{ "_id": "cl1", "name": "Fresh Press" }]),
    );
    assert!(shell.model.session.location().is_some());

    shell.send(Event::LocationPermissionResult { granted: false });

    assert!(shell.model.session.location().is_none());
    assert_eq!(
        shell.view().location_message.as_deref(),
        Some(LOCATION_REQUIRED_MESSAGE)
    );
    assert_matches!(
        shell.screen(),
        ScreenView::Cleaners(view) if view.message.is_some() && view.cleaners.is_empty()
    );

    shell.send(Event::Refresh);
    assert!(!shell.has_request("client/cleaners_nearby"));
}
