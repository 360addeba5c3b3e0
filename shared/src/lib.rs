#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod model;
pub mod mutation;
pub mod navigation;
pub mod reconcile;
pub mod services;
pub mod session;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use error::{AppError, AppResult, ErrorKind, ErrorSeverity};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the requested services list.
pub const REQUESTS_KEY: &str = "requests";

pub const DEFAULT_CLEANER_SEARCH_MILES: u32 = 10;

/// Status shown for a client with no active order in the unit.
pub const NEEDS_AN_ORDER: &str = "Needs an order";
pub const NO_ORDERS_MESSAGE: &str = "You have no orders";
pub const LOCATION_REQUIRED_MESSAGE: &str = "Location access is needed to do orders";
