//! Scripted stand-ins for the external services, recording every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::geocoding::GeocodingService;
use super::postal_code::{normalize_postal_code, PostalCodeService};
use super::routing::RoutingService;
use super::{AddressComponents, GeoPoint, ResolvedAddress, ServiceError};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn point(latitude: f64, longitude: f64, address: AddressComponents, display_name: &str) -> GeoPoint {
    GeoPoint::new(latitude, longitude, address, display_name.to_string()).unwrap()
}

#[derive(Default)]
pub struct MockGeocoder {
    pub places: HashMap<String, GeoPoint>,
    pub log: CallLog,
}

impl MockGeocoder {
    pub fn new(log: &CallLog) -> Self {
        MockGeocoder {
            places: HashMap::new(),
            log: log.clone(),
        }
    }

    pub fn with(mut self, query: &str, point: GeoPoint) -> Self {
        self.places.insert(query.to_string(), point);
        self
    }
}

#[async_trait]
impl GeocodingService for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeoPoint, ServiceError> {
        self.log.lock().unwrap().push(format!("geocode {query}"));
        self.places.get(query).cloned().ok_or(ServiceError::NotFound)
    }
}

#[derive(Default)]
pub struct MockPostalCodes {
    pub addresses: HashMap<String, ResolvedAddress>,
    pub log: CallLog,
}

impl MockPostalCodes {
    pub fn new(log: &CallLog) -> Self {
        MockPostalCodes {
            addresses: HashMap::new(),
            log: log.clone(),
        }
    }

    pub fn with(mut self, digits: &str, address: ResolvedAddress) -> Self {
        self.addresses.insert(digits.to_string(), address);
        self
    }
}

#[async_trait]
impl PostalCodeService for MockPostalCodes {
    async fn resolve_postal_code(&self, code: &str) -> Result<ResolvedAddress, ServiceError> {
        self.log.lock().unwrap().push(format!("postal {code}"));
        self.addresses
            .get(&normalize_postal_code(code))
            .cloned()
            .ok_or(ServiceError::NotFound)
    }
}

pub struct MockRouter {
    pub kilometers: Option<f64>,
    pub log: CallLog,
}

impl MockRouter {
    pub fn new(log: &CallLog, kilometers: Option<f64>) -> Self {
        MockRouter {
            kilometers,
            log: log.clone(),
        }
    }
}

#[async_trait]
impl RoutingService for MockRouter {
    async fn route_distance(&self, from: &GeoPoint, to: &GeoPoint) -> Result<f64, ServiceError> {
        self.log.lock().unwrap().push(format!(
            "route {},{} -> {},{}",
            from.latitude, from.longitude, to.latitude, to.longitude
        ));
        self.kilometers.ok_or_else(|| ServiceError::RouteStatus("NoRoute".to_string()))
    }
}

/// Avenida Paulista as both services describe it.
pub fn paulista() -> (ResolvedAddress, GeoPoint) {
    let address = ResolvedAddress {
        postal_code: Some("01310100".into()),
        neighborhood: "Bela Vista".into(),
        city: "São Paulo".into(),
        region: "SP".into(),
        full_text: "Avenida Paulista, Bela Vista, São Paulo, SP".into(),
    };
    let geo = point(
        -23.5613,
        -46.6565,
        AddressComponents {
            road: Some("Avenida Paulista".into()),
            suburb: Some("Bela Vista".into()),
            city: Some("São Paulo".into()),
            state: Some("São Paulo".into()),
            postcode: Some("01310-100".into()),
            ..Default::default()
        },
        "Avenida Paulista, Bela Vista, São Paulo, Região Metropolitana de São Paulo, Brasil",
    );
    (address, geo)
}

pub fn campinas() -> GeoPoint {
    point(
        -22.9056,
        -47.0608,
        AddressComponents {
            city: Some("Campinas".into()),
            state: Some("São Paulo".into()),
            ..Default::default()
        },
        "Campinas, Região Imediata de Campinas, São Paulo, Brasil",
    )
}

pub fn sao_paulo() -> GeoPoint {
    point(
        -23.5506,
        -46.6333,
        AddressComponents {
            city: Some("São Paulo".into()),
            state: Some("São Paulo".into()),
            ..Default::default()
        },
        "São Paulo, Região Imediata de São Paulo, São Paulo, Brasil",
    )
}
