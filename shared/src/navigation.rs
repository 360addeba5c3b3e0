use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetch::ScreenKey;
use crate::model::{Apartment, ApartmentId, BuildingId, CleanerId, Order, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    ActiveOrders,
    Apartments,
    Cleaners,
    Account,
}

impl Tab {
    #[must_use]
    pub const fn root(self) -> Route {
        match self {
            Self::ActiveOrders => Route::ActiveOrders,
            Self::Apartments => Route::Apartments,
            Self::Cleaners => Route::Cleaners,
            Self::Account => Route::Account,
        }
    }
}

/// A screen together with the payload it was opened with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Route {
    ActiveOrders,
    OrderDetail {
        order: Box<Order>,
    },
    Unit {
        apt_id: ApartmentId,
        bld_id: BuildingId,
        unit_num: String,
        unit_id: UnitId,
        apartment: Box<Apartment>,
    },
    EditBagQuantity {
        order: Box<Order>,
    },
    Apartments,
    Building {
        apt_id: ApartmentId,
        bld_id: BuildingId,
        apartment: Box<Apartment>,
    },
    Cleaners,
    Cleaner {
        cleaner_id: CleanerId,
    },
    CleanerDropOff {
        cleaner_id: CleanerId,
        cleaner_name: String,
    },
    CleanerPickups {
        cleaner_id: CleanerId,
        cleaner_name: String,
    },
    Account,
}

impl Route {
    /// The screen whose fetches this route owns, if it fetches anything.
    #[must_use]
    pub const fn screen(&self) -> Option<ScreenKey> {
        match self {
            Self::ActiveOrders => Some(ScreenKey::ActiveOrders),
            Self::OrderDetail { .. } => Some(ScreenKey::OrderDetail),
            Self::Unit { .. } => Some(ScreenKey::Unit),
            Self::Apartments => Some(ScreenKey::Apartments),
            Self::Building { .. } => Some(ScreenKey::Building),
            Self::Cleaners => Some(ScreenKey::Cleaners),
            Self::Cleaner { .. } => Some(ScreenKey::Cleaner),
            Self::CleanerDropOff { .. } => Some(ScreenKey::CleanerDropOff),
            Self::CleanerPickups { .. } => Some(ScreenKey::CleanerPickups),
            Self::EditBagQuantity { .. } | Self::Account => None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ActiveOrders => "active_orders",
            Self::OrderDetail { .. } => "order_detail",
            Self::Unit { .. } => "unit",
            Self::EditBagQuantity { .. } => "edit_bag_quantity",
            Self::Apartments => "apartments",
            Self::Building { .. } => "building",
            Self::Cleaners => "cleaners",
            Self::Cleaner { .. } => "cleaner",
            Self::CleanerDropOff { .. } => "cleaner_drop_off",
            Self::CleanerPickups { .. } => "cleaner_pickups",
            Self::Account => "account",
        }
    }
}

/// Route stack for the selected tab. The tab root is never popped.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    tab: Tab,
    root: Route,
    pushed: Vec<Route>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self::at(Tab::default())
    }
}

impl Navigation {
    fn at(tab: Tab) -> Self {
        Self {
            tab,
            root: tab.root(),
            pushed: Vec::new(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn current(&self) -> &Route {
        self.pushed.last().unwrap_or(&self.root)
    }

    pub fn depth(&self) -> usize {
        self.pushed.len() + 1
    }

    /// Routes from the tab root up to the current one.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        std::iter::once(&self.root).chain(self.pushed.iter())
    }

    pub fn push(&mut self, route: Route) {
        debug!(from = self.current().name(), to = route.name(), "navigate");
        self.pushed.push(route);
    }

    /// Pops the top route and returns it, unless only the tab root is left.
    pub fn pop(&mut self) -> Option<Route> {
        let left = self.pushed.pop()?;
        debug!(to = self.current().name(), "navigate back");
        Some(left)
    }

    /// The route that [`Self::pop`] would return to.
    pub fn below_mut(&mut self) -> Option<&mut Route> {
        match self.pushed.len() {
            0 => None,
            1 => Some(&mut self.root),
            n => self.pushed.get_mut(n - 2),
        }
    }

    /// Switches to `tab`, resetting its stack to the root. Returns the
    /// routes that were left.
    pub fn switch_tab(&mut self, tab: Tab) -> Vec<Route> {
        let previous = std::mem::replace(self, Self::at(tab));
        debug!(tab = ?tab, "switch tab");
        std::iter::once(previous.root).chain(previous.pushed).collect()
    }
}
