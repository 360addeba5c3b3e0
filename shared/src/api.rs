//! Typed access to the driver backend.
//!
//! Every operation starts one request on the `crux_http` capability and
//! decodes the reply into an [`ApiResult`]. Failures keep their cause
//! ([`ApiErrorKind`]) so callers can tell an expired session from a dropped
//! connection. No operation retries.

use std::collections::BTreeMap;

use crux_http::http::{Body, Method};
use crux_http::{Error as HttpError, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::capabilities::{AppHttp, Reject, UrlError, ValidatedUrl};
use crate::config::ApiConfig;
use crate::error::{AppError, ErrorKind};
use crate::event::Event;
use crate::model::{
    Apartment, ApartmentId, BuildingId, Cleaner, CleanerId, Driver, LatLon, Order, OrderId, Unit,
    UnitId, UnitResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
    /// The request could not be built.
    Request,
    Network,
    Timeout,
    Auth,
    Forbidden,
    NotFound,
    Validation,
    Server,
    Decode,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{endpoint} failed ({kind:?}): {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub endpoint: String,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, endpoint: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            endpoint: endpoint.to_string(),
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(endpoint: &str, status: u16, message: Option<String>) -> Self {
        let kind = match status {
            401 => ApiErrorKind::Auth,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            400 | 422 => ApiErrorKind::Validation,
            408 => ApiErrorKind::Timeout,
            _ => ApiErrorKind::Server,
        };
        Self {
            kind,
            endpoint: endpoint.to_string(),
            status: Some(status),
            message: message.unwrap_or_else(|| format!("HTTP error: {status}")),
        }
    }

    /// Maps a `crux_http` failure. Status failures keep their code.
    pub fn from_transport(endpoint: &str, error: &HttpError) -> Self {
        let kind = match error {
            HttpError::Http(failure) => {
                return Self::from_status(endpoint, u16::from(failure.code), None);
            }
            HttpError::Timeout => ApiErrorKind::Timeout,
            HttpError::Io(_) => ApiErrorKind::Network,
            // Raised while putting the request together, never by the shell.
            HttpError::Url(_) | HttpError::Json(_) => ApiErrorKind::Request,
        };
        Self::new(kind, endpoint, error.to_string())
    }

    /// Authorization failures invalidate the session.
    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }
}

impl From<&ApiError> for AppError {
    fn from(e: &ApiError) -> Self {
        let error = match e.status {
            Some(status) => AppError::from_http_status(status, Some(&e.message)),
            None => {
                let kind = match e.kind {
                    ApiErrorKind::Request => ErrorKind::Internal,
                    ApiErrorKind::Network => ErrorKind::Network,
                    ApiErrorKind::Timeout => ErrorKind::Timeout,
                    ApiErrorKind::Auth => ErrorKind::Authentication,
                    ApiErrorKind::Forbidden => ErrorKind::Authorization,
                    ApiErrorKind::NotFound => ErrorKind::NotFound,
                    ApiErrorKind::Validation => ErrorKind::Validation,
                    ApiErrorKind::Server => ErrorKind::Server,
                    ApiErrorKind::Decode => ErrorKind::Deserialization,
                };
                AppError::new(kind, e.message.clone())
            }
        };
        error.with_context("endpoint", &e.endpoint)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Collapses a result to the "absent" value screens fall back on, logging
/// the cause.
pub trait Sentinel<T> {
    /// `None` on failure.
    fn or_absent(self) -> Option<T>;

    /// An empty collection on failure.
    fn or_empty(self) -> T
    where
        T: Default;
}

impl<T> Sentinel<T> for ApiResult<T> {
    fn or_absent(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(endpoint = %e.endpoint, kind = ?e.kind, error = %e.message, "request failed");
                None
            }
        }
    }

    fn or_empty(self) -> T
    where
        T: Default,
    {
        self.or_absent().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps a `crux_http` response onto a typed API result. Non-2xx replies
/// arrive as [`HttpError::Http`] carrying the body, which may hold a
/// `message` or `error` field.
pub fn decode<T: DeserializeOwned>(
    endpoint: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> ApiResult<T> {
    match result {
        Ok(mut response) => {
            let body = response.take_body().unwrap_or_default();
            serde_json::from_slice::<T>(&body).map_err(|e| {
                warn!(endpoint, error = %e, "response body did not match the expected shape");
                ApiError::new(ApiErrorKind::Decode, endpoint, e.to_string())
            })
        }
        Err(HttpError::Http(failure)) => {
            let message = failure
                .body
                .as_deref()
                .and_then(|body| serde_json::from_slice::<ErrorBody>(body).ok())
                .and_then(|b| b.message.or(b.error));
            Err(ApiError::from_status(endpoint, u16::from(failure.code), message))
        }
        Err(e) => Err(ApiError::from_transport(endpoint, &e)),
    }
}

/// One variant per backend endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    DriverProfile,
    Order { order_id: OrderId },
    Orders { order_ids: Vec<OrderId> },
    NearbyCleaners { location: LatLon, max_distance: f64 },
    DriverActiveOrders,
    CleanerActiveOrders { cleaner_id: CleanerId },
    CleanerPickups { cleaner_id: CleanerId },
    PickUpOrders { cleaner_id: CleanerId, order_ids: Vec<OrderId> },
    Cleaner { cleaner_id: CleanerId },
    CleanerDropOff { cleaner_id: CleanerId, order_ids: Vec<OrderId> },
    Apartments,
    Apartment { apartment_id: ApartmentId },
    ActiveUnits { apartment_id: ApartmentId, building_id: BuildingId },
    Unit { unit_id: UnitId },
    CancelOrder { order_id: OrderId },
    CreateOrder { unit_id: UnitId, client_email: String },
    ClientDropoff { order_id: OrderId },
    UpdateBagQuantity { order_id: OrderId, bag_quantity: u32 },
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DriverProfile => "get_driver",
            Self::Order { .. } => "get_order",
            Self::Orders { .. } => "get_orders",
            Self::NearbyCleaners { .. } => "get_nearby_cleaners",
            Self::DriverActiveOrders => "get_driver_active_orders",
            Self::CleanerActiveOrders { .. } => "get_cleaner_active_orders",
            Self::CleanerPickups { .. } => "get_cleaner_pickups",
            Self::PickUpOrders { .. } => "pick_up_orders",
            Self::Cleaner { .. } => "get_cleaner",
            Self::CleanerDropOff { .. } => "cleaner_drop_off",
            Self::Apartments => "get_apartments",
            Self::Apartment { .. } => "get_apartment",
            Self::ActiveUnits { .. } => "get_active_units",
            Self::Unit { .. } => "get_unit",
            Self::CancelOrder { .. } => "cancel_order",
            Self::CreateOrder { .. } => "create_order",
            Self::ClientDropoff { .. } => "client_dropoff",
            Self::UpdateBagQuantity { .. } => "update_bag_quantity",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::DriverProfile
            | Self::Order { .. }
            | Self::DriverActiveOrders
            | Self::CleanerActiveOrders { .. }
            | Self::CleanerPickups { .. }
            | Self::Cleaner { .. }
            | Self::Apartments
            | Self::Apartment { .. }
            | Self::ActiveUnits { .. }
            | Self::Unit { .. } => Method::Get,
            Self::CancelOrder { .. } => Method::Delete,
            Self::Orders { .. }
            | Self::NearbyCleaners { .. }
            | Self::PickUpOrders { .. }
            | Self::CleanerDropOff { .. }
            | Self::CreateOrder { .. }
            | Self::ClientDropoff { .. }
            | Self::UpdateBagQuantity { .. } => Method::Post,
        }
    }

    /// Whether the call changes backend-held order state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::PickUpOrders { .. }
                | Self::CleanerDropOff { .. }
                | Self::CancelOrder { .. }
                | Self::CreateOrder { .. }
                | Self::ClientDropoff { .. }
                | Self::UpdateBagQuantity { .. }
        )
    }

    pub fn path(&self) -> Vec<String> {
        fn segs(parts: &[&str]) -> Vec<String> {
            parts.iter().map(|s| (*s).to_string()).collect()
        }

        match self {
            Self::DriverProfile => segs(&["driver"]),
            Self::Order { order_id } => segs(&["driver", "order", order_id.as_str()]),
            Self::Orders { .. } => segs(&["driver", "order", "orders"]),
            Self::NearbyCleaners { .. } => segs(&["client", "cleaners_nearby"]),
            Self::DriverActiveOrders => segs(&["driver", "order", "active_orders"]),
            Self::CleanerActiveOrders { cleaner_id } => {
                segs(&["driver", "cleaner", cleaner_id.as_str(), "active_orders"])
            }
            Self::CleanerPickups { cleaner_id } => {
                segs(&["driver", "cleaner", cleaner_id.as_str(), "pickups"])
            }
            Self::PickUpOrders { cleaner_id, .. } => {
                segs(&["driver", "order", "cleaner_pickups", cleaner_id.as_str()])
            }
            Self::Cleaner { cleaner_id } => segs(&["driver", "cleaner", cleaner_id.as_str()]),
            Self::CleanerDropOff { cleaner_id, .. } => {
                segs(&["driver", "cleaner", cleaner_id.as_str(), "drop_off"])
            }
            Self::Apartments => segs(&["driver", "apartments"]),
            Self::Apartment { apartment_id } => {
                segs(&["driver", "apartment", apartment_id.as_str()])
            }
            Self::ActiveUnits {
                apartment_id,
                building_id,
            } => segs(&[
                "driver",
                "apartment",
                apartment_id.as_str(),
                building_id.as_str(),
                "active_units",
            ]),
            Self::Unit { unit_id } => segs(&["driver", "apartment", "unitId", unit_id.as_str()]),
            Self::CancelOrder { order_id } => {
                segs(&["driver", "order", order_id.as_str(), "cancel_order"])
            }
            Self::CreateOrder {
                unit_id,
                client_email,
            } => segs(&[
                "driver",
                "order",
                "client_create",
                unit_id.as_str(),
                client_email,
            ]),
            Self::ClientDropoff { order_id } => {
                segs(&["driver", "order", order_id.as_str(), "client_dropoff"])
            }
            Self::UpdateBagQuantity {
                order_id,
                bag_quantity,
            } => segs(&[
                "driver",
                "order",
                "bagquantity",
                order_id.as_str(),
                &bag_quantity.to_string(),
            ]),
        }
    }

    pub fn body(&self) -> Option<serde_json::Value> {
        match self {
            Self::Orders { order_ids }
            | Self::PickUpOrders { order_ids, .. }
            | Self::CleanerDropOff { order_ids, .. } => Some(json!({ "orderIds": order_ids })),
            Self::NearbyCleaners {
                location,
                max_distance,
            } => Some(json!({
                "latitude": location.lat,
                "longitude": location.lon,
                "maxDistance": max_distance,
            })),
            Self::UpdateBagQuantity { bag_quantity, .. } => {
                Some(json!({ "bagQuantity": bag_quantity }))
            }
            _ => None,
        }
    }

    pub fn url(&self, config: &ApiConfig) -> Result<ValidatedUrl, UrlError> {
        config.base_url().join_segments(&self.path())
    }

    /// The `Authorization` value. It carries the literal `null` when there
    /// is no token.
    pub fn authorization(token: Option<&str>) -> String {
        let bearer = match token {
            Some(t) if !t.is_empty() => t,
            _ => "null",
        };
        format!("Bearer {bearer}")
    }

    /// Starts the request on `http`. A request that cannot be put together
    /// is rejected before it reaches the shell, so the failure still comes
    /// back through the caller's event.
    pub fn build(
        &self,
        http: &AppHttp,
        config: &ApiConfig,
        token: Option<&str>,
    ) -> RequestBuilder<Event> {
        match self.prepare(config, token) {
            Ok((url, authorization, body)) => {
                let mut request = self
                    .start(http, url.as_str())
                    .header("Authorization", authorization)
                    .header("Accept", "application/json");
                if let Some(body) = body {
                    request = request.body(body);
                }
                request
            }
            Err(e) => {
                warn!(endpoint = self.name(), error = %e, "could not build request");
                self.start(http, config.base_url().as_str())
                    .middleware(Reject(e))
            }
        }
    }

    fn prepare(
        &self,
        config: &ApiConfig,
        token: Option<&str>,
    ) -> crux_http::Result<(ValidatedUrl, String, Option<Body>)> {
        let url = self
            .url(config)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let authorization = Self::authorization(token);
        if !authorization
            .chars()
            .all(|c| c.is_ascii() && !c.is_ascii_control())
        {
            return Err(HttpError::Url(
                "token is not a valid header value".to_string(),
            ));
        }

        let body = self
            .body()
            .map(|b| Body::from_json(&b).map_err(|e| HttpError::Json(e.to_string())))
            .transpose()?;

        Ok((url, authorization, body))
    }

    fn start(&self, http: &AppHttp, url: &str) -> RequestBuilder<Event> {
        match self.method() {
            Method::Delete => http.delete(url),
            Method::Post => http.post(url),
            _ => http.get(url),
        }
    }
}

/// Issues typed requests on behalf of the app.
pub struct ApiClient<'a> {
    http: &'a AppHttp,
    config: &'a ApiConfig,
    token: Option<&'a str>,
}

impl<'a> ApiClient<'a> {
    pub fn new(http: &'a AppHttp, config: &'a ApiConfig, token: Option<&'a str>) -> Self {
        Self {
            http,
            config,
            token,
        }
    }

    fn send<T, F>(&self, endpoint: &Endpoint, make_event: F)
    where
        T: DeserializeOwned,
        F: FnOnce(ApiResult<T>) -> Event + Send + 'static,
    {
        let name = endpoint.name();
        debug!(endpoint = name, mutation = endpoint.is_mutation(), "sending request");
        endpoint
            .build(self.http, self.config, self.token)
            .send(move |result| make_event(decode(name, result)));
    }

    pub fn get_driver<F>(&self, make_event: F)
    where
        F: FnOnce(ApiResult<Driver>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::DriverProfile, make_event);
    }

    pub fn get_order<F>(&self, order_id: OrderId, make_event: F)
    where
        F: FnOnce(ApiResult<Order>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Order { order_id }, make_event);
    }

    pub fn get_orders<F>(&self, order_ids: Vec<OrderId>, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Orders { order_ids }, make_event);
    }

    pub fn get_nearby_cleaners<F>(&self, location: LatLon, max_distance: f64, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Cleaner>>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::NearbyCleaners {
                location,
                max_distance,
            },
            make_event,
        );
    }

    pub fn get_driver_active_orders<F>(&self, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::DriverActiveOrders, make_event);
    }

    pub fn get_cleaner_active_orders<F>(&self, cleaner_id: CleanerId, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::CleanerActiveOrders { cleaner_id }, make_event);
    }

    pub fn get_cleaner_pickups<F>(&self, cleaner_id: CleanerId, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::CleanerPickups { cleaner_id }, make_event);
    }

    pub fn pick_up_orders<F>(&self, cleaner_id: CleanerId, order_ids: Vec<OrderId>, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::PickUpOrders {
                cleaner_id,
                order_ids,
            },
            make_event,
        );
    }

    pub fn get_cleaner<F>(&self, cleaner_id: CleanerId, make_event: F)
    where
        F: FnOnce(ApiResult<Cleaner>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Cleaner { cleaner_id }, make_event);
    }

    pub fn cleaner_drop_off<F>(&self, cleaner_id: CleanerId, order_ids: Vec<OrderId>, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Order>>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::CleanerDropOff {
                cleaner_id,
                order_ids,
            },
            make_event,
        );
    }

    pub fn get_apartments<F>(&self, make_event: F)
    where
        F: FnOnce(ApiResult<Vec<Apartment>>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Apartments, make_event);
    }

    pub fn get_apartment<F>(&self, apartment_id: ApartmentId, make_event: F)
    where
        F: FnOnce(ApiResult<Apartment>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Apartment { apartment_id }, make_event);
    }

    pub fn get_active_units<F>(&self, apartment_id: ApartmentId, building_id: BuildingId, make_event: F)
    where
        F: FnOnce(ApiResult<BTreeMap<String, Unit>>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::ActiveUnits {
                apartment_id,
                building_id,
            },
            make_event,
        );
    }

    pub fn get_unit<F>(&self, unit_id: UnitId, make_event: F)
    where
        F: FnOnce(ApiResult<UnitResponse>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::Unit { unit_id }, make_event);
    }

    pub fn cancel_order<F>(&self, order_id: OrderId, make_event: F)
    where
        F: FnOnce(ApiResult<Order>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::CancelOrder { order_id }, make_event);
    }

    pub fn create_order<F>(&self, unit_id: UnitId, client_email: String, make_event: F)
    where
        F: FnOnce(ApiResult<Order>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::CreateOrder {
                unit_id,
                client_email,
            },
            make_event,
        );
    }

    pub fn client_dropoff<F>(&self, order_id: OrderId, make_event: F)
    where
        F: FnOnce(ApiResult<Order>) -> Event + Send + 'static,
    {
        self.send(&Endpoint::ClientDropoff { order_id }, make_event);
    }

    pub fn update_bag_quantity<F>(&self, order_id: OrderId, bag_quantity: u32, make_event: F)
    where
        F: FnOnce(ApiResult<Order>) -> Event + Send + 'static,
    {
        self.send(
            &Endpoint::UpdateBagQuantity {
                order_id,
                bag_quantity,
            },
            make_event,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crux_http::testing::ResponseBuilder;

    fn config() -> ApiConfig {
        ApiConfig::new("https://api.example.com/").unwrap()
    }

    fn ok(body: &serde_json::Value) -> crux_http::Result<Response<Vec<u8>>> {
        Ok(ResponseBuilder::ok()
            .body(serde_json::to_vec(body).unwrap())
            .build())
    }

    /// A non-2xx reply the way `crux_http` reports it.
    fn status_failure(status: u16, body: Option<serde_json::Value>) -> HttpError {
        let mut error = HttpError::from(crux_http::http::Error::from_str(status, "failed"));
        if let HttpError::Http(failure) = &mut error {
            failure.body = body.map(|b| serde_json::to_vec(&b).unwrap());
        }
        error
    }

    #[test]
    fn test_bearer_header_uses_token() {
        assert_eq!(Endpoint::authorization(Some("tok")), "Bearer tok");
        let url = Endpoint::DriverProfile.url(&config()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/driver");
        assert_eq!(Endpoint::DriverProfile.method(), Method::Get);
    }

    #[test]
    fn test_bearer_header_literal_null_without_token() {
        assert_eq!(Endpoint::authorization(None), "Bearer null");
        assert_eq!(Endpoint::authorization(Some("")), "Bearer null");
    }

    #[test]
    fn test_unprintable_token_is_refused_before_sending() {
        let err = Endpoint::DriverProfile
            .prepare(&config(), Some("tök"))
            .unwrap_err();
        assert_eq!(
            ApiError::from_transport("get_driver", &err).kind,
            ApiErrorKind::Request
        );
    }

    #[test]
    fn test_create_order_path_keeps_email() {
        let endpoint = Endpoint::CreateOrder {
            unit_id: UnitId::new("U1"),
            client_email: "a@b.com".into(),
        };
        let (url, _, body) = endpoint.prepare(&config(), Some("t")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/driver/order/client_create/U1/a@b.com"
        );
        assert_eq!(endpoint.method(), Method::Post);
        assert!(body.is_none());
        assert!(endpoint.is_mutation());
    }

    #[test]
    fn test_cancel_order_is_delete() {
        let endpoint = Endpoint::CancelOrder {
            order_id: OrderId::new("o1"),
        };
        assert_eq!(endpoint.method(), Method::Delete);
        assert_eq!(
            endpoint.url(&config()).unwrap().as_str(),
            "https://api.example.com/driver/order/o1/cancel_order"
        );
    }

    #[test]
    fn test_bag_quantity_in_path_and_body() {
        let endpoint = Endpoint::UpdateBagQuantity {
            order_id: OrderId::new("o1"),
            bag_quantity: 4,
        };
        assert_eq!(
            endpoint.url(&config()).unwrap().as_str(),
            "https://api.example.com/driver/order/bagquantity/o1/4"
        );
        assert_eq!(endpoint.body(), Some(json!({ "bagQuantity": 4 })));
    }

    #[test]
    fn test_nearby_cleaners_body() {
        let endpoint = Endpoint::NearbyCleaners {
            location: LatLon::new(40.0, -73.0).unwrap(),
            max_distance: 10.0,
        };
        let body = endpoint.body().unwrap();
        assert_eq!(body["latitude"], 40.0);
        assert_eq!(body["longitude"], -73.0);
        assert_eq!(body["maxDistance"], 10.0);
        assert!(!endpoint.is_mutation());
    }

    #[test]
    fn test_active_units_path() {
        let endpoint = Endpoint::ActiveUnits {
            apartment_id: ApartmentId::new("apt1"),
            building_id: BuildingId::new("B"),
        };
        assert_eq!(
            endpoint.path(),
            vec!["driver", "apartment", "apt1", "B", "active_units"]
        );
    }

    #[test]
    fn test_order_ids_body() {
        let endpoint = Endpoint::CleanerDropOff {
            cleaner_id: CleanerId::new("cl1"),
            order_ids: vec![OrderId::new("o1"), OrderId::new("o2")],
        };
        assert_eq!(endpoint.body(), Some(json!({ "orderIds": ["o1", "o2"] })));
        assert_eq!(endpoint.path(), vec!["driver", "cleaner", "cl1", "drop_off"]);
    }

    #[test]
    fn test_decode_success() {
        let orders: ApiResult<Vec<Order>> = decode("get_driver_active_orders", ok(&json!([])));
        assert_eq!(orders, Ok(vec![]));
    }

    #[test]
    fn test_decode_status_kinds() {
        let cases = [
            (401, ApiErrorKind::Auth),
            (403, ApiErrorKind::Forbidden),
            (404, ApiErrorKind::NotFound),
            (400, ApiErrorKind::Validation),
            (422, ApiErrorKind::Validation),
            (500, ApiErrorKind::Server),
            (503, ApiErrorKind::Server),
        ];
        for (status, kind) in cases {
            let result: ApiResult<Driver> = decode("get_driver", Err(status_failure(status, None)));
            let err = result.unwrap_err();
            assert_eq!(err.kind, kind, "status {status}");
            assert_eq!(err.status, Some(status));
        }
    }

    #[test]
    fn test_decode_error_message_from_body() {
        let failure = status_failure(400, Some(json!({ "message": "no such client" })));
        let result: ApiResult<Order> = decode("create_order", Err(failure));
        assert_eq!(result.unwrap_err().message, "no such client");

        let failure = status_failure(500, Some(json!({ "error": "boom" })));
        let result: ApiResult<Order> = decode("create_order", Err(failure));
        assert_eq!(result.unwrap_err().message, "boom");
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let result: ApiResult<Vec<Order>> = decode("get_orders", ok(&json!({ "unexpected": true })));
        assert_eq!(result.unwrap_err().kind, ApiErrorKind::Decode);
    }

    #[test]
    fn test_decode_transport_failures() {
        let result: ApiResult<Driver> = decode("get_driver", Err(HttpError::Timeout));
        assert_eq!(result.unwrap_err().kind, ApiErrorKind::Timeout);

        let result: ApiResult<Driver> =
            decode("get_driver", Err(HttpError::Io("connection refused".into())));
        assert_eq!(result.unwrap_err().kind, ApiErrorKind::Network);

        let result: ApiResult<Driver> =
            decode("get_driver", Err(HttpError::Url("bad".into())));
        assert_eq!(result.unwrap_err().kind, ApiErrorKind::Request);
    }

    #[test]
    fn test_sentinels() {
        let failed: ApiResult<Vec<Apartment>> =
            Err(ApiError::new(ApiErrorKind::Network, "get_apartments", "down"));
        assert!(failed.or_empty().is_empty());

        let failed: ApiResult<Apartment> =
            Err(ApiError::new(ApiErrorKind::NotFound, "get_apartment", "gone"));
        assert!(failed.or_absent().is_none());
    }

    #[test]
    fn test_api_error_into_app_error() {
        let err = ApiError::from_status("get_unit", 401, None);
        assert!(err.is_auth());
        let app: AppError = (&err).into();
        assert_eq!(app.kind, ErrorKind::Authentication);
        assert_eq!(app.context.get("endpoint").map(String::as_str), Some("get_unit"));
    }
}
