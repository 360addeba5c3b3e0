//! The "requested services" list kept on the device between launches.

use std::collections::HashSet;

use tracing::warn;

use crate::capabilities::{encode_json, read_json, KvError, KvResult};
use crate::model::{Service, ServiceId};
use crate::REQUESTS_KEY;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestedServices {
    services: Vec<Service>,
}

impl RequestedServices {
    /// Builds the list, keeping the first occurrence of each id.
    pub fn from_services(services: Vec<Service>) -> Self {
        let mut seen = HashSet::new();
        let services = services
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
        Self { services }
    }

    /// Reads the stored list. Anything unreadable counts as empty.
    pub fn from_stored(stored: KvResult) -> Self {
        match read_json::<Vec<Service>>(stored) {
            Ok(Some(services)) => Self::from_services(services),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(key = REQUESTS_KEY, error = %e, "discarding unreadable requested services");
                Self::default()
            }
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.services.iter().any(|s| &s.id == id)
    }

    /// Adds `service` if absent, removes it otherwise. Returns whether it is
    /// now requested.
    pub fn toggle(&mut self, service: Service) -> bool {
        if self.contains(&service.id) {
            self.services.retain(|s| s.id != service.id);
            false
        } else {
            self.services.push(service);
            true
        }
    }

    /// The bytes stored under the requests key. An empty list is stored
    /// too, so a cleared list stays cleared.
    pub fn encode(&self) -> Result<Vec<u8>, KvError> {
        encode_json(&self.services)
    }
}
